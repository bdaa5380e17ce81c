//! SNMPv1 over UDP

use std::net::SocketAddr;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::{lookup_host, UdpSocket};
use tokio::sync::Mutex;
use tracing::{debug, trace};

use super::ber::{Message, PduKind, VarBind, ERROR_NO_SUCH_NAME};
use super::oid::Oid;
use super::transport::{SnmpTransport, TransportError};
use super::{SnmpSettings, SwitchCredential};

/// Large enough for any reply to a single-varbind GetNext
const MAX_DATAGRAM_SIZE: usize = 65_507;

/// SNMPv1 over a connected UDP socket.
pub struct UdpTransport {
    socket: UdpSocket,
    peer: SocketAddr,
    community: Vec<u8>,
    timeout: Duration,
    retries: u32,
    next_request_id: AtomicI32,
    recv_buf: Mutex<Vec<u8>>,
}

impl UdpTransport {
    pub async fn connect(
        credential: &SwitchCredential,
        settings: &SnmpSettings,
    ) -> Result<Self, TransportError> {
        let peer = resolve_peer(&credential.address, settings.port).await?;

        let bind_addr: SocketAddr = if peer.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(peer).await?;

        debug!(switch = %peer, "SNMP session opened");

        // keep ids positive and away from a previous session's
        let first_id = (uuid::Uuid::new_v4().as_u128() as u32 & 0x3fff_ffff) as i32;

        Ok(Self {
            socket,
            peer,
            community: credential.read_community.as_bytes().to_vec(),
            timeout: settings.timeout,
            retries: settings.retries,
            next_request_id: AtomicI32::new(first_id),
            recv_buf: Mutex::new(vec![0u8; MAX_DATAGRAM_SIZE]),
        })
    }

    /// Reads datagrams until one answers `request_id`. Anything else,
    /// including datagrams that fail to decode, is dropped.
    async fn receive(&self, request_id: i32) -> Result<Message, TransportError> {
        let mut buf = self.recv_buf.lock().await;
        loop {
            let len = self.socket.recv(&mut buf[..]).await?;
            let message = match Message::decode(&buf[..len]) {
                Ok(message) => message,
                Err(e) => {
                    trace!(switch = %self.peer, error = %e, len, "Ignoring undecodable datagram");
                    continue;
                }
            };
            if message.pdu.kind != PduKind::GetResponse || message.pdu.request_id != request_id
            {
                trace!(
                    switch = %self.peer,
                    expected = request_id,
                    received = message.pdu.request_id,
                    "Ignoring unrelated SNMP datagram"
                );
                continue;
            }
            return Ok(message);
        }
    }
}

#[async_trait]
impl SnmpTransport for UdpTransport {
    async fn get_next(&self, oid: &Oid) -> Result<VarBind, TransportError> {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let request = Message::get_next(&self.community, request_id, oid).encode()?;
        let attempts = self.retries.saturating_add(1);

        for attempt in 1..=attempts {
            self.socket.send(&request).await?;
            trace!(switch = %self.peer, %oid, request_id, attempt, "GetNext sent");

            match tokio::time::timeout(self.timeout, self.receive(request_id)).await {
                Ok(reply) => return first_varbind(reply?),
                Err(_) => debug!(switch = %self.peer, %oid, attempt, "GetNext timed out"),
            }
        }

        Err(TransportError::Timeout { attempts })
    }
}

async fn resolve_peer(address: &str, port: u16) -> Result<SocketAddr, TransportError> {
    if let Ok(addr) = address.parse::<SocketAddr>() {
        return Ok(addr);
    }
    lookup_host((address, port))
        .await
        .map_err(|_| TransportError::Unresolvable(address.to_string()))?
        .next()
        .ok_or_else(|| TransportError::Unresolvable(address.to_string()))
}

fn first_varbind(message: Message) -> Result<VarBind, TransportError> {
    let pdu = message.pdu;
    match pdu.error_status {
        0 => pdu
            .varbinds
            .into_iter()
            .next()
            .ok_or(TransportError::EmptyResponse),
        ERROR_NO_SUCH_NAME => Err(TransportError::NoSuchName),
        status => Err(TransportError::ErrorStatus {
            status,
            index: pdu.error_index,
        }),
    }
}
