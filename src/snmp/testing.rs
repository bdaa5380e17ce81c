//! In-memory agent for resolver and walk tests

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::ber::{SnmpValue, VarBind};
use super::oid::Oid;
use super::transport::{SnmpTransport, TransportError};

/// Answers GetNext from a sorted table like an SNMPv1 agent would,
/// including noSuchName past the last object.
pub struct TableAgent {
    objects: BTreeMap<Oid, SnmpValue>,
    unreachable_under: Vec<Oid>,
    requests: AtomicUsize,
}

impl TableAgent {
    pub fn new(objects: impl IntoIterator<Item = (Oid, SnmpValue)>) -> Self {
        Self {
            objects: objects.into_iter().collect(),
            unreachable_under: Vec::new(),
            requests: AtomicUsize::new(0),
        }
    }

    /// Requests at or under `root` time out.
    pub fn time_out_under(mut self, root: &[u32]) -> Self {
        self.unreachable_under.push(Oid::from(root));
        self
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnmpTransport for TableAgent {
    async fn get_next(&self, oid: &Oid) -> Result<VarBind, TransportError> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        if self
            .unreachable_under
            .iter()
            .any(|root| oid == root || oid.is_under(root))
        {
            return Err(TransportError::Timeout { attempts: 2 });
        }

        self.objects
            .range((Bound::Excluded(oid.clone()), Bound::Unbounded))
            .next()
            .map(|(oid, value)| VarBind::new(oid.clone(), value.clone()))
            .ok_or(TransportError::NoSuchName)
    }
}
