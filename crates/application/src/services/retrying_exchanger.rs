use crate::ports::UpstreamExchanger;
use dns_retry_domain::{DomainError, Transport};
use hickory_proto::op::{Message, ResponseCode};
use std::sync::Arc;
use tracing::debug;

/// Retries a nameserver once when it answers SERVFAIL.
///
/// Transport errors are returned as-is. The second attempt's outcome is
/// final whatever it is; there is never a third attempt.
pub struct RetryingExchanger {
    inner: Arc<dyn UpstreamExchanger>,
}

impl RetryingExchanger {
    pub fn new(inner: Arc<dyn UpstreamExchanger>) -> Self {
        Self { inner }
    }

    pub async fn exchange(
        &self,
        nameserver: &str,
        transport: Transport,
        query: &Message,
    ) -> Result<Message, DomainError> {
        let response = self.inner.exchange(nameserver, transport, query).await?;
        if response.response_code() != ResponseCode::ServFail {
            return Ok(response);
        }

        debug!(
            server = nameserver,
            transport = %transport,
            id = query.id(),
            "Upstream answered SERVFAIL, retrying once"
        );
        self.inner.exchange(nameserver, transport, query).await
    }
}
