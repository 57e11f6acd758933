use crate::dns::wire;
use dns_retry_application::services::responses::{format_error, server_failure};
use dns_retry_application::use_cases::ForwardQueryUseCase;
use dns_retry_domain::{ProxyConfig, Transport};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Turns one raw inbound message into the raw reply for the client.
#[derive(Clone)]
pub struct DnsServerHandler {
    use_case: Arc<ForwardQueryUseCase>,
    nameservers: Arc<[String]>,
}

impl DnsServerHandler {
    pub fn new(use_case: Arc<ForwardQueryUseCase>, config: &ProxyConfig) -> Self {
        Self {
            use_case,
            nameservers: Arc::from(config.nameservers.clone()),
        }
    }

    pub fn nameservers(&self) -> &[String] {
        &self.nameservers
    }

    /// Returns `None` when nothing should be sent back, which only happens
    /// for input too short to carry a transaction ID.
    pub async fn handle_raw(
        &self,
        bytes: &[u8],
        transport: Transport,
        client: SocketAddr,
    ) -> Option<Vec<u8>> {
        let query = match wire::decode_message(bytes) {
            Ok(query) => query,
            Err(e) => {
                let Some(id) = wire::peek_id(bytes) else {
                    debug!(client = %client, len = bytes.len(), "Dropping runt message");
                    return None;
                };
                warn!(client = %client, transport = %transport, error = %e, "Malformed query");
                return wire::encode_message(&format_error(id)).ok();
            }
        };

        debug!(
            client = %client,
            transport = %transport,
            id = query.id(),
            questions = ?query.queries().iter().map(|q| q.name().to_string()).collect::<Vec<_>>(),
            "DNS query received"
        );

        let response = self
            .use_case
            .execute(&query, transport, &self.nameservers)
            .await;

        match wire::encode_message(&response) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                error!(id = query.id(), error = %e, "Failed to encode response, replying SERVFAIL");
                wire::encode_message(&server_failure(&query)).ok()
            }
        }
    }
}
