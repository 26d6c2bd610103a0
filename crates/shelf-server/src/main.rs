//! Shelf Server Binary
//!
//! Standalone server for the imshelf provider proxy and item API.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shelf_core::ShelfConfig;
use shelf_server::{serve, AppState};

const DEFAULT_LOG_FILTER: &str = "shelf_server=info,shelf_core=info,tower_http=info";

/// Personal library server
#[derive(Parser)]
#[command(name = "shelf-server", version, about = "Personal library server")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, env = "SHELF_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind, overriding the config file
    #[arg(long)]
    addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = ShelfConfig::load(cli.config.as_deref())?;
    if let Some(addr) = cli.addr {
        config.server.addr = addr;
    }

    let addr = config.server.addr.clone();
    let state = Arc::new(AppState::from_config(config)?);

    serve(&addr, state).await
}
