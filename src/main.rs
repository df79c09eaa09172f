//! assetgate: serve a directory tree over HTTP.
//!
//! ```text
//! assetgate --config assetgate.toml
//! assetgate --root ./public
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use assetgate::config::{load_config, AppConfig};
use assetgate::file::BaseDir;
use assetgate::observability::{logging, metrics};
use assetgate::HttpServer;

#[derive(Debug, Parser)]
#[command(name = "assetgate", version, about = "Static file server")]
struct Cli {
    /// Path to a TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Root directory to serve; overrides `static_files.root_path`.
    #[arg(short, long)]
    root: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(root) = cli.root {
        config.static_files.root_path = Some(root);
    }

    logging::init(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "assetgate starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        prefixes = config.paths.len(),
        file_routes = config.files.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let base = BaseDir::current()?;
    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    HttpServer::new(config, &base)?.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
