//! MAC to switch-port chain over BRIDGE-MIB and IF-MIB

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace, warn};

use super::mac::{MacAddress, MacParseError};
use super::oid::{Oid, DOT1D_BASE_PORT_IF_INDEX, DOT1D_TP_FDB_PORT, IF_DESCR, IF_NAME};
use super::transport::{SnmpTransport, TransportError};
use super::walk::{first_match, walk};
use super::PortMapping;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ForwardingTable,
    BasePort,
    InterfaceName,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ForwardingTable => "forwarding table",
            Stage::BasePort => "base port",
            Stage::InterfaceName => "interface name",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid MAC address: {0}")]
    InvalidInput(#[from] MacParseError),

    #[error("SNMP support is not built into this binary")]
    ProtocolUnavailable,

    #[error("no {stage} entry for this client")]
    NoMapping { stage: Stage },

    #[error("{stage} lookup failed: {source}")]
    Transport {
        stage: Stage,
        #[source]
        source: TransportError,
    },
}

impl ResolveError {
    fn transport(stage: Stage) -> impl FnOnce(TransportError) -> Self {
        move |source| ResolveError::Transport { stage, source }
    }
}

/// Runs the three-stage chain against one agent session.
pub struct PortChain<'a, T: ?Sized> {
    transport: &'a T,
}

impl<'a, T> PortChain<'a, T>
where
    T: SnmpTransport + ?Sized,
{
    pub fn new(transport: &'a T) -> Self {
        Self { transport }
    }

    pub async fn resolve(&self, mac: MacAddress) -> Result<PortMapping, ResolveError> {
        let base_port = self.base_port(mac).await?;
        trace!(%mac, base_port, "Forwarding entry found");

        let if_index = self.if_index(base_port).await?;
        trace!(%mac, if_index, "Base port mapped");

        let if_name = self.label(IF_NAME, if_index).await?;
        let if_descr = self.label(IF_DESCR, if_index).await?;

        Ok(PortMapping {
            if_index,
            if_name,
            if_descr,
        })
    }

    /// dot1dTpFdbPort row indexed by the MAC. The first row whose OID ends in
    /// the MAC octets decides, even if its value is unusable.
    async fn base_port(&self, mac: MacAddress) -> Result<u32, ResolveError> {
        let suffix = mac.oid_suffix();
        let rows = walk(self.transport, Oid::from(DOT1D_TP_FDB_PORT));
        let hit = first_match(rows, |vb| vb.oid.ends_with(&suffix))
            .await
            .map_err(ResolveError::transport(Stage::ForwardingTable))?;

        hit.and_then(|vb| vb.value.as_index())
            .ok_or(ResolveError::NoMapping {
                stage: Stage::ForwardingTable,
            })
    }

    async fn if_index(&self, base_port: u32) -> Result<u32, ResolveError> {
        let rows = walk(self.transport, Oid::from(DOT1D_BASE_PORT_IF_INDEX));
        let hit = first_match(rows, |vb| vb.oid.last_arc() == Some(base_port))
            .await
            .map_err(ResolveError::transport(Stage::BasePort))?;

        hit.and_then(|vb| vb.value.as_index())
            .ok_or(ResolveError::NoMapping {
                stage: Stage::BasePort,
            })
    }

    /// ifName or ifDescr for `if_index`. A missing row is not an error.
    async fn label(&self, column: &[u32], if_index: u32) -> Result<Option<String>, ResolveError> {
        let rows = walk(self.transport, Oid::from(column));
        let hit = first_match(rows, |vb| vb.oid.last_arc() == Some(if_index))
            .await
            .map_err(ResolveError::transport(Stage::InterfaceName))?;

        Ok(hit.and_then(|vb| vb.value.as_text()))
    }
}

/// Collapses a lookup outcome to found / not found, keeping only malformed
/// input as an error. The reason for a miss goes to the log.
pub fn fold_outcome(
    switch: &str,
    outcome: Result<PortMapping, ResolveError>,
) -> Result<Option<PortMapping>, MacParseError> {
    match outcome {
        Ok(mapping) => {
            debug!(switch, if_index = mapping.if_index, "Switch port resolved");
            Ok(Some(mapping))
        }
        Err(ResolveError::InvalidInput(e)) => Err(e),
        Err(ResolveError::Transport { stage, source }) => {
            warn!(switch, %stage, error = %source, "Switch port lookup failed");
            Ok(None)
        }
        Err(e @ ResolveError::NoMapping { .. }) | Err(e @ ResolveError::ProtocolUnavailable) => {
            debug!(switch, reason = %e, "No switch port mapping");
            Ok(None)
        }
    }
}
