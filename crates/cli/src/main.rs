use clap::Parser;
use dns_retry_domain::{parse_nameserver_list, CliOverrides};
use std::time::Duration;
use tracing::{error, info};

mod bootstrap;
mod di;
mod server;

#[derive(Parser)]
#[command(name = "dns-retry")]
#[command(version)]
#[command(about = "DNS forwarding proxy with retry and ordered failover")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// Address to listen on for UDP and TCP queries
    #[arg(short = 'l', long, env = "BIND_ADDR", value_name = "HOST:PORT")]
    listen: Option<String>,

    /// Comma separated upstream nameservers, tried in order
    #[arg(short = 'n', long, env = "NAMESERVERS", value_name = "HOST:PORT,...")]
    nameservers: Option<String>,

    /// Upstream read timeout in milliseconds
    #[arg(long, value_name = "MS")]
    read_timeout: Option<u64>,

    /// Upstream write timeout in milliseconds
    #[arg(long, value_name = "MS")]
    write_timeout: Option<u64>,

    /// Shorthand for --log-level debug
    #[arg(long)]
    debug: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, conflicts_with = "debug")]
    log_level: Option<String>,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        let log_level = if self.debug {
            Some("debug".to_string())
        } else {
            self.log_level.clone()
        };

        CliOverrides {
            bind_address: self.listen.clone(),
            nameservers: self.nameservers.as_deref().map(parse_nameserver_list),
            read_timeout: self.read_timeout.map(Duration::from_millis),
            write_timeout: self.write_timeout.map(Duration::from_millis),
            log_level,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = bootstrap::load_config(cli.config.as_deref(), cli.overrides())?;

    bootstrap::init_logging(&config);

    info!("Starting dns-retry v{}", env!("CARGO_PKG_VERSION"));
    info!(
        bind_address = %config.proxy.bind_address,
        nameservers = ?config.proxy.nameservers,
        read_timeout_ms = config.proxy.read_timeout.as_millis() as u64,
        write_timeout_ms = config.proxy.write_timeout.as_millis() as u64,
        "Running with"
    );

    let dns_services = di::DnsServices::new(&config);

    tokio::select! {
        result = server::start_dns_server(&config, dns_services.handler) => {
            if let Err(e) = &result {
                error!(error = %e, "DNS server error");
            }
            result?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
