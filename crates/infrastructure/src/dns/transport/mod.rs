pub mod tcp;
pub mod udp;

use async_trait::async_trait;
use dns_retry_domain::{DomainError, Transport};
use std::net::SocketAddr;
use std::time::Duration;

/// Per-direction bounds for one upstream exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeTimeouts {
    /// Bounds waiting for the reply
    pub read: Duration,
    /// Bounds connecting and sending the query
    pub write: Duration,
}

#[async_trait]
pub trait DnsTransport: Send + Sync {
    /// Sends one wire-format query and returns the raw reply.
    async fn send(
        &self,
        message_bytes: &[u8],
        timeouts: ExchangeTimeouts,
    ) -> Result<Vec<u8>, DomainError>;

    fn protocol_name(&self) -> &'static str;
}

pub enum UpstreamTransport {
    Udp(udp::UdpTransport),
    Tcp(tcp::TcpTransport),
}

impl UpstreamTransport {
    pub async fn send(
        &self,
        message_bytes: &[u8],
        timeouts: ExchangeTimeouts,
    ) -> Result<Vec<u8>, DomainError> {
        match self {
            Self::Udp(t) => DnsTransport::send(t, message_bytes, timeouts).await,
            Self::Tcp(t) => DnsTransport::send(t, message_bytes, timeouts).await,
        }
    }

    pub fn protocol_name(&self) -> &'static str {
        match self {
            Self::Udp(t) => t.protocol_name(),
            Self::Tcp(t) => t.protocol_name(),
        }
    }
}

pub fn create_transport(transport: Transport, server_addr: SocketAddr) -> UpstreamTransport {
    match transport {
        Transport::Udp => UpstreamTransport::Udp(udp::UdpTransport::new(server_addr)),
        Transport::Tcp => UpstreamTransport::Tcp(tcp::TcpTransport::new(server_addr)),
    }
}
