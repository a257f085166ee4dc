//! # fleet-api: Binary Entry Point
//!
//! Starts the HTTP server and the battery degradation scheduler. Both stop
//! on Ctrl-C.

use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use fleet_api::state::AppConfig;

/// Drone fleet controller.
#[derive(Parser, Debug)]
#[command(name = "fleet-api", version, about)]
struct Cli {
    /// Port to listen on. Overrides `PORT`.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::from_env().context("reading configuration")?;
    if let Some(port) = cli.port {
        config.port = port;
    }

    init_tracing(config.log_json);

    let port = config.port;
    let boot = fleet_api::bootstrap::bootstrap(config).await.map_err(|e| {
        tracing::error!("Bootstrap failed: {e}");
        e
    })?;

    let shutdown = CancellationToken::new();
    let scheduler = boot.scheduler.spawn(shutdown.child_token());

    let app = fleet_api::app(boot.state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("fleet controller listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown.cancel();
    if let Err(e) = scheduler.await {
        tracing::error!("degradation scheduler panicked: {e}");
    }
    tracing::info!("fleet controller stopped");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
