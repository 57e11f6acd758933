use dns_retry_domain::Config;
use dns_retry_infrastructure::dns::{DnsListener, DnsServerHandler};
use tracing::info;

/// Binds the UDP and TCP listeners and serves until one of them fails.
pub async fn start_dns_server(config: &Config, handler: DnsServerHandler) -> anyhow::Result<()> {
    let bind_address = &config.proxy.bind_address;
    info!(bind_address = %bind_address, "Starting DNS server");

    let listener = DnsListener::bind(bind_address, handler)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", bind_address, e))?;

    listener.serve().await?;
    Ok(())
}
