use dns_retry_application::use_cases::ForwardQueryUseCase;
use dns_retry_domain::Config;
use dns_retry_infrastructure::dns::{DnsServerHandler, UpstreamClients};
use std::sync::Arc;
use tracing::info;

pub struct DnsServices {
    pub handler: DnsServerHandler,
}

impl DnsServices {
    pub fn new(config: &Config) -> Self {
        info!(
            nameservers = config.proxy.nameservers.len(),
            "Initializing forwarding services"
        );

        let upstream = Arc::new(UpstreamClients::from_config(&config.proxy));
        let use_case = Arc::new(ForwardQueryUseCase::new(upstream));
        let handler = DnsServerHandler::new(use_case, &config.proxy);

        Self { handler }
    }
}
