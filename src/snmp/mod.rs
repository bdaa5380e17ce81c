//! Switch-port resolution over SNMP
//!
//! Finds the switch port a client MAC is attached to by chaining three
//! read-only table walks on the switch: the bridge forwarding table gives
//! the base port, the base-port table gives the ifIndex, and IF-MIB gives
//! the port's name and description.

pub mod ber;
pub mod mac;
pub mod oid;
pub mod resolver;
pub mod transport;
#[cfg(feature = "snmp")]
mod udp;
pub mod walk;

#[cfg(test)]
mod testing;

use std::fmt;
use std::time::Duration;

use serde::Serialize;

pub use mac::{MacAddress, MacParseError};
pub use resolver::{ResolveError, Stage};

use resolver::fold_outcome;
#[cfg(feature = "snmp")]
use resolver::PortChain;
#[cfg(feature = "snmp")]
use udp::UdpTransport;

/// Where to ask and how to authenticate. Supplied per call.
#[derive(Clone, PartialEq, Eq)]
pub struct SwitchCredential {
    pub address: String,
    pub read_community: String,
}

impl SwitchCredential {
    pub fn new(address: impl Into<String>, read_community: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            read_community: read_community.into(),
        }
    }
}

impl fmt::Debug for SwitchCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwitchCredential")
            .field("address", &self.address)
            .field("read_community", &"<redacted>")
            .finish()
    }
}

/// The switch port a client was found on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortMapping {
    pub if_index: u32,
    pub if_name: Option<String>,
    pub if_descr: Option<String>,
}

impl PortMapping {
    /// Best human-readable label: name, then description, then the index.
    pub fn label(&self) -> String {
        self.if_name
            .clone()
            .or_else(|| self.if_descr.clone())
            .unwrap_or_else(|| format!("ifIndex {}", self.if_index))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnmpSettings {
    pub port: u16,
    /// Per attempt
    pub timeout: Duration,
    pub retries: u32,
}

impl Default for SnmpSettings {
    fn default() -> Self {
        Self {
            port: 161,
            timeout: Duration::from_secs(1),
            retries: 1,
        }
    }
}

/// Client-to-port resolver. Holds no state between calls.
#[derive(Debug, Clone, Default)]
pub struct SwitchPortResolver {
    settings: SnmpSettings,
}

impl SwitchPortResolver {
    pub fn new(settings: SnmpSettings) -> Self {
        Self { settings }
    }

    /// Resolves `mac` to a port, or `None` when no mapping could be found for
    /// any reason other than malformed input.
    pub async fn resolve(
        &self,
        credential: SwitchCredential,
        mac: &str,
    ) -> Result<Option<PortMapping>, MacParseError> {
        let switch = credential.address.clone();
        let outcome = self.lookup(credential, mac).await;
        fold_outcome(&switch, outcome)
    }

    /// Like [`resolve`](Self::resolve) but reports why a lookup failed.
    pub async fn lookup(
        &self,
        credential: SwitchCredential,
        mac: &str,
    ) -> Result<PortMapping, ResolveError> {
        let mac: MacAddress = mac.parse()?;
        self.query_switch(&credential, mac).await
    }

    #[cfg(feature = "snmp")]
    async fn query_switch(
        &self,
        credential: &SwitchCredential,
        mac: MacAddress,
    ) -> Result<PortMapping, ResolveError> {
        let transport = UdpTransport::connect(credential, &self.settings)
            .await
            .map_err(|source| ResolveError::Transport {
                stage: Stage::ForwardingTable,
                source,
            })?;

        PortChain::new(&transport).resolve(mac).await
    }

    /// Built without SNMP support: nothing leaves the host.
    #[cfg(not(feature = "snmp"))]
    async fn query_switch(
        &self,
        _credential: &SwitchCredential,
        _mac: MacAddress,
    ) -> Result<PortMapping, ResolveError> {
        Err(ResolveError::ProtocolUnavailable)
    }
}
