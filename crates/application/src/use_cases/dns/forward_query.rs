use crate::ports::UpstreamExchanger;
use crate::services::responses::{finalize_response, server_failure};
use crate::services::RetryingExchanger;
use dns_retry_domain::Transport;
use hickory_proto::op::{Message, ResponseCode};
use std::sync::Arc;
use tracing::{debug, warn};

/// Walks the nameserver list in order until one produces an acceptable
/// answer.
///
/// A nameserver is abandoned on a transport error or an NXDOMAIN answer.
/// Any other answer is accepted, including a SERVFAIL that survived the
/// single retry: persistent SERVFAIL does not fail over. When the list runs
/// out, the outcome of the last nameserver decides: its NXDOMAIN is passed
/// on, while a transport error (or an empty list) yields a locally built
/// SERVFAIL.
pub struct ForwardQueryUseCase {
    exchanger: RetryingExchanger,
}

impl ForwardQueryUseCase {
    pub fn new(upstream: Arc<dyn UpstreamExchanger>) -> Self {
        Self {
            exchanger: RetryingExchanger::new(upstream),
        }
    }

    /// Never fails; the returned message always carries the query's ID.
    pub async fn execute(
        &self,
        query: &Message,
        transport: Transport,
        nameservers: &[String],
    ) -> Message {
        let mut last_nxdomain = None;

        for (position, nameserver) in nameservers.iter().enumerate() {
            match self.exchanger.exchange(nameserver, transport, query).await {
                Ok(response) if response.response_code() == ResponseCode::NXDomain => {
                    debug!(
                        server = %nameserver,
                        position,
                        id = query.id(),
                        "NXDOMAIN, trying next nameserver"
                    );
                    last_nxdomain = Some(response);
                }
                Ok(response) => {
                    debug!(
                        server = %nameserver,
                        position,
                        id = query.id(),
                        rcode = ?response.response_code(),
                        answers = response.answers().len(),
                        "Upstream response accepted"
                    );
                    return finalize_response(response, query);
                }
                Err(e) => {
                    last_nxdomain = None;
                    warn!(
                        server = %nameserver,
                        transport = %transport,
                        position,
                        error = %e,
                        "Failing over"
                    );
                }
            }
        }

        if let Some(response) = last_nxdomain {
            debug!(id = query.id(), "Every nameserver tried, passing on NXDOMAIN");
            return finalize_response(response, query);
        }

        warn!(
            id = query.id(),
            nameservers = nameservers.len(),
            "No nameserver produced an answer, replying SERVFAIL"
        );
        server_failure(query)
    }
}
