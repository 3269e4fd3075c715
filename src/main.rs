//! Circuit-breaking reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────┐
//!                     │                 BREAKER PROXY                    │
//!                     │                                                  │
//!  Client Request     │  ┌─────────┐   ┌───────────┐   ┌─────────────┐   │
//!  ───────────────────┼─▶│  http   │──▶│ admission │──▶│  upstream   │───┼──▶ Upstream
//!                     │  │ server  │   │   gate    │   │   client    │   │
//!                     │  └─────────┘   └─────┬─────┘   └──────┬──────┘   │
//!                     │                      │ reads          │ latency  │
//!                     │                      ▼                ▼          │
//!                     │               ┌──────────────┐  ┌───────────┐    │
//!                     │               │   circuit    │◀─│  health   │────┼──▶ Upstream
//!                     │               │   breaker    │  │  monitor  │    │   (probe)
//!                     │               └──────────────┘  └───────────┘    │
//!                     └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use breaker_proxy::config::{load_config, ProxyConfig};
use breaker_proxy::lifecycle::{self, Shutdown};
use breaker_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "breaker-proxy", version)]
#[command(about = "Reverse proxy that shields one upstream behind a circuit breaker", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    if cli.check {
        println!("Configuration OK");
        return Ok(());
    }

    logging::init_logging(&config.observability)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?cli.config,
        "breaker-proxy starting"
    );

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            lifecycle::wait_for_signal().await;
            shutdown.trigger();
        }
    });

    lifecycle::start(config, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
