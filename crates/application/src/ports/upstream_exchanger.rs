use async_trait::async_trait;
use dns_retry_domain::{DomainError, Transport};
use hickory_proto::op::Message;

/// One query/response round trip against one nameserver.
///
/// Implementations bound the exchange by their configured timeouts and
/// report timeouts, refused connections and undecodable replies as `Err`.
/// A reply carrying an error response code is still `Ok`.
#[async_trait]
pub trait UpstreamExchanger: Send + Sync {
    async fn exchange(
        &self,
        nameserver: &str,
        transport: Transport,
        query: &Message,
    ) -> Result<Message, DomainError>;
}
