use std::net::SocketAddr;

use argent_dns_domain::CliOverrides;
use clap::Parser;
use tracing::{error, info};

mod bootstrap;
mod di;

#[derive(Parser)]
#[command(name = "argent-dns")]
#[command(version)]
#[command(about = "Argent DNS - a routing DNS forwarder with bootstrap resolution")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// Listen address, replacing the configured ones
    #[arg(short = 'l', long)]
    listen: Option<SocketAddr>,

    /// Upstream address, replacing every configured group
    #[arg(short = 'u', long)]
    upstream: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let overrides = CliOverrides {
        listen_address: cli.listen,
        upstream: cli.upstream.clone(),
        log_level: cli.log_level.clone(),
    };

    let config = bootstrap::load_config(cli.config.as_deref(), overrides)?;
    bootstrap::init_logging(&config);

    info!("Starting Argent DNS v{}", env!("CARGO_PKG_VERSION"));

    let mut service = di::build_dns_service(&config)?;
    service.start().await?;

    tokio::signal::ctrl_c().await?;
    info!("Received interrupt, shutting down");

    if let Err(e) = service.shutdown().await {
        error!(error = %e, "Shutdown finished with errors");
    }

    Ok(())
}
