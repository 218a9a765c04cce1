//! hubchat daemon - line-protocol chat server
//!
//! # Usage
//!
//! ```bash
//! # Listen on the default address (0.0.0.0:8081)
//! hubchatd
//!
//! # Custom address
//! hubchatd --listen 127.0.0.1:9000
//! HUBCHAT_LISTEN=127.0.0.1:9000 hubchatd
//!
//! # Explicit config file
//! hubchatd --config ./hubchat.toml
//!
//! # Enable debug logging
//! RUST_LOG=hubchatd=debug hubchatd
//! ```
//!
//! # Signal Handling
//!
//! - SIGTERM/SIGINT: stop accepting connections and exit

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use hubchatd::config::Config;
use hubchatd::hub::spawn_hub;
use hubchatd::server::ChatServer;

/// hubchat daemon - chat hub with handles, channels and direct messages
#[derive(Parser, Debug)]
#[command(name = "hubchatd", version, about)]
struct Args {
    /// Config file (default: <config dir>/hubchat/config.toml if present)
    #[arg(short, long, env = "HUBCHAT_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overrides the config file
    #[arg(short, long, env = "HUBCHAT_LISTEN")]
    listen: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(listen) = args.listen {
        config.server.listen = listen;
    }

    run_server(config)
}

/// Runs the server (async entry point).
#[tokio::main]
async fn run_server(config: Config) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("hubchatd=info".parse()?)
                .add_directive("hubchat_protocol=info".parse()?),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "hubchat daemon starting");

    let cancel_token = CancellationToken::new();

    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            error!(error = %e, "Error waiting for shutdown signal");
        }
        info!("Shutdown signal received");
        shutdown_token.cancel();
    });

    let hub = spawn_hub(&config.hub);
    info!("Hub started");

    let server = ChatServer::bind(&config.server.listen, hub, config.session, cancel_token)
        .await
        .context("Failed to start server")?;

    if let Err(e) = server.run().await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("hubchat daemon stopped");
    Ok(())
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}
