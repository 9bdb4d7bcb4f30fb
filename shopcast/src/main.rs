use anyhow::{Context, Result};
use clap::Parser;
use shopcast::cli::Cli;
use shopcast::server::{Reaper, SignalingService, router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("Invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = cli.sfu_config();
    info!(
        ws_path = %config.ws_path,
        ice_servers = config.transport.ice_servers.len(),
        "Starting SFU"
    );

    let service = SignalingService::with_webrtc(config);
    let shutdown = CancellationToken::new();
    let reaper = Reaper::new(service.clone()).spawn(shutdown.clone());

    let listener = TcpListener::bind(&cli.bind)
        .await
        .with_context(|| format!("Failed to bind {}", cli.bind))?;
    info!("Signaling server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    shutdown.cancel();
    reaper.await.context("Reaper task panicked")?;
    info!("SFU stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
