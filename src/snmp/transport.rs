//! SNMP request/response transport

use async_trait::async_trait;
use thiserror::Error;

use super::ber::{BerError, VarBind};
use super::oid::Oid;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("could not resolve switch address '{0}'")]
    Unresolvable(String),

    #[error("no response after {attempts} attempt(s)")]
    Timeout { attempts: u32 },

    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed message: {0}")]
    Codec(#[from] BerError),

    #[error("agent has no object past the requested one")]
    NoSuchName,

    #[error("agent returned error-status {status} (index {index})")]
    ErrorStatus { status: i64, index: i64 },

    #[error("response carried no variable bindings")]
    EmptyResponse,

    #[error("agent returned {returned} for a request at {requested}")]
    NotIncreasing { requested: Oid, returned: Oid },
}

/// One GetNext round trip. Implementations own retries and timeouts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnmpTransport: Send + Sync {
    async fn get_next(&self, oid: &Oid) -> Result<VarBind, TransportError>;
}
