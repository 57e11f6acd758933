//! UDP Transport for DNS queries (RFC 1035 §4.2.1)
//!
//! Messages are sent as-is (no framing). A truncated (TC) reply is handed
//! back unchanged; the client decides whether to retry over TCP.

use super::{DnsTransport, ExchangeTimeouts};
use async_trait::async_trait;
use dns_retry_domain::DomainError;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Largest UDP payload, so EDNS(0) replies above the classic 4096 bytes
/// arrive whole instead of being cut off and failing to decode.
const MAX_UDP_RESPONSE_SIZE: usize = 65535;

/// DNS over UDP transport
pub struct UdpTransport {
    server_addr: SocketAddr,
}

impl UdpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }

    fn timeout_error(&self) -> DomainError {
        DomainError::TransportTimeout {
            server: self.server_addr.to_string(),
        }
    }
}

#[async_trait]
impl DnsTransport for UdpTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeouts: ExchangeTimeouts,
    ) -> Result<Vec<u8>, DomainError> {
        let server = self.server_addr.to_string();

        // Bind to ephemeral port (0 = OS assigns)
        let bind_addr = if self.server_addr.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };

        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| DomainError::from_io(&server, &e))?;

        let bytes_sent =
            tokio::time::timeout(timeouts.write, socket.send_to(message_bytes, self.server_addr))
                .await
                .map_err(|_| self.timeout_error())?
                .map_err(|e| DomainError::from_io(&server, &e))?;

        debug!(server = %self.server_addr, bytes_sent, "UDP query sent");

        let deadline = Instant::now() + timeouts.read;
        let mut recv_buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];

        loop {
            let (bytes_received, from_addr) =
                tokio::time::timeout_at(deadline, socket.recv_from(&mut recv_buf))
                    .await
                    .map_err(|_| self.timeout_error())?
                    .map_err(|e| DomainError::from_io(&server, &e))?;

            if from_addr != self.server_addr {
                warn!(
                    expected = %self.server_addr,
                    received_from = %from_addr,
                    "Ignoring UDP datagram from unexpected source"
                );
                continue;
            }

            if bytes_received < 2 || recv_buf.get(..2) != message_bytes.get(..2) {
                debug!(server = %self.server_addr, "Ignoring UDP response with mismatched ID");
                continue;
            }

            recv_buf.truncate(bytes_received);
            debug!(server = %self.server_addr, bytes_received, "UDP response received");
            return Ok(recv_buf);
        }
    }

    fn protocol_name(&self) -> &'static str {
        "UDP"
    }
}
