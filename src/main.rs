use std::path::PathBuf;

use clap::Parser;

use canvas_proxy::config::{load_config, validate_config, ConfigError};
use canvas_proxy::lifecycle;
use canvas_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "canvas-proxy")]
#[command(about = "Forwarding proxy for the Canvas LMS API", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref(), |key| std::env::var(key).ok())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    logging::init_logging(&config.observability);
    tracing::info!("canvas-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    lifecycle::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
