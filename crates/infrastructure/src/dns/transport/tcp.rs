//! TCP Transport for DNS queries (RFC 1035 §4.2.2)
//!
//! Every message is prefixed with its length as a big-endian u16. One
//! connection is opened per exchange.

use super::{DnsTransport, ExchangeTimeouts};
use async_trait::async_trait;
use dns_retry_domain::DomainError;
use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

pub(crate) const MAX_TCP_MESSAGE_SIZE: usize = 65535;

pub struct TcpTransport {
    server_addr: SocketAddr,
}

impl TcpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }

    fn timeout_error(&self) -> DomainError {
        DomainError::TransportTimeout {
            server: self.server_addr.to_string(),
        }
    }

    async fn connect(&self, timeouts: ExchangeTimeouts) -> Result<TcpStream, DomainError> {
        let stream = tokio::time::timeout(timeouts.write, TcpStream::connect(self.server_addr))
            .await
            .map_err(|_| self.timeout_error())?
            .map_err(|e| DomainError::from_io(self.server_addr.to_string(), &e))?;

        stream
            .set_nodelay(true)
            .map_err(|e| DomainError::from_io(self.server_addr.to_string(), &e))?;

        Ok(stream)
    }
}

#[async_trait]
impl DnsTransport for TcpTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeouts: ExchangeTimeouts,
    ) -> Result<Vec<u8>, DomainError> {
        let server = self.server_addr.to_string();
        let mut stream = self.connect(timeouts).await?;

        tokio::time::timeout(
            timeouts.write,
            send_with_length_prefix(&mut stream, message_bytes),
        )
        .await
        .map_err(|_| self.timeout_error())?
        .map_err(|e| DomainError::from_io(&server, &e))?;

        debug!(server = %self.server_addr, message_len = message_bytes.len(), "TCP query sent");

        let response_bytes =
            tokio::time::timeout(timeouts.read, read_with_length_prefix(&mut stream))
                .await
                .map_err(|_| self.timeout_error())?
                .map_err(|e| DomainError::from_io(&server, &e))?;

        debug!(server = %self.server_addr, response_len = response_bytes.len(), "TCP response received");

        Ok(response_bytes)
    }

    fn protocol_name(&self) -> &'static str {
        "TCP"
    }
}

pub(crate) async fn send_with_length_prefix<S>(stream: &mut S, message_bytes: &[u8]) -> io::Result<()>
where
    S: AsyncWriteExt + Unpin,
{
    let length = u16::try_from(message_bytes.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "DNS message too large for TCP framing: {} bytes (max {})",
                message_bytes.len(),
                MAX_TCP_MESSAGE_SIZE
            ),
        )
    })?;

    stream.write_all(&length.to_be_bytes()).await?;
    stream.write_all(message_bytes).await?;
    stream.flush().await
}

pub(crate) async fn read_with_length_prefix<S>(stream: &mut S) -> io::Result<Vec<u8>>
where
    S: AsyncReadExt + Unpin,
{
    let mut len_buf = [0u8; 2];
    stream.read_exact(&mut len_buf).await?;

    let message_len = u16::from_be_bytes(len_buf) as usize;
    let mut message = vec![0u8; message_len];
    stream.read_exact(&mut message).await?;

    Ok(message)
}
