use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use nimbus_api::rest::{AppState, create_router};
use nimbus_api::{ServiceConfig, Services};
use nimbus_core::{DataStore, MemoryStore, ProviderAccount, SqliteStore};

#[derive(Parser)]
#[command(name = "nimbus-api")]
#[command(about = "nimbus API Server - job orchestration for provider-backed volumes")]
struct Args {
    /// Listen address for REST API
    #[arg(short, long, default_value = "[::]:8080")]
    listen: String,

    /// Data directory for the metadata database
    #[arg(short, long, default_value = "/var/lib/nimbus")]
    data_dir: PathBuf,

    /// Run in development mode (ephemeral in-memory storage)
    #[arg(long)]
    dev: bool,

    /// Provider account (format: id:provider_type:location[,location], can be repeated)
    #[arg(long, value_parser = parse_account)]
    account: Vec<ProviderAccount>,

    /// Interval for re-polling pending provider jobs, in milliseconds
    #[arg(long, default_value_t = 1000)]
    poll_interval_ms: u64,

    /// Let mock provider jobs finish on their own after this many milliseconds
    #[arg(long)]
    mock_latency_ms: Option<u64>,
}

fn parse_account(s: &str) -> Result<ProviderAccount, String> {
    s.parse()
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("nimbus_api=info".parse()?)
                .add_directive("nimbus_core=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let store: Arc<dyn DataStore> = if args.dev {
        info!("Development mode: using in-memory store");
        Arc::new(MemoryStore::new())
    } else {
        tokio::fs::create_dir_all(&args.data_dir)
            .await
            .with_context(|| format!("creating {}", args.data_dir.display()))?;
        let dir = args.data_dir.to_string_lossy();
        Arc::new(
            SqliteStore::new(&dir)
                .await
                .context("opening metadata database")?,
        )
    };

    let mut config = ServiceConfig {
        poll_interval: Duration::from_millis(args.poll_interval_ms),
        mock_latency: args.mock_latency_ms.map(Duration::from_millis),
        ..ServiceConfig::default()
    };
    if !args.account.is_empty() {
        config.accounts = args.account;
    }

    let services = Services::assemble(store, &config);
    let state = Arc::new(AppState {
        cloud: services.cloud,
    });
    let router = create_router(state).layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    info!("REST API listening on {}", args.listen);

    // Create shutdown signal channel
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);

    let listener_handle = tokio::spawn(services.listener.run(shutdown_tx.subscribe()));

    let rest_handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown_rx.changed().await.ok();
            })
            .await
    });

    // Wait for shutdown signal
    let ctrl_c = signal::ctrl_c();
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
        .context("installing SIGTERM handler")?;

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = sigterm.recv() => info!("Received SIGTERM"),
    }

    let _ = shutdown_tx.send(true);

    let _ = rest_handle.await;
    let _ = listener_handle.await;

    info!("Shutdown complete");
    Ok(())
}
