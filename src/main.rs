//! Process Miner Streaming Service - Binary Entry Point
//!
//! This is the main entry point for the miner-server binary.

use std::sync::Arc;

use process_miner::api::{create_router, AppState};
use process_miner::config::MinerConfig;
use process_miner::discovery::DirectlyFollowsMiner;
use process_miner::error::MinerResult;
use process_miner::pipeline::MinerService;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> MinerResult<()> {
    init_tracing();

    let config = MinerConfig::from_env()?;
    info!(
        persistence = ?config.persistence,
        rebuild_ms = config.pipeline.rebuild_interval.as_millis() as u64,
        broadcast_ms = config.pipeline.broadcast_interval.as_millis() as u64,
        "configuration in effect"
    );

    let store = config.persistence.event_store()?;
    let service = Arc::new(MinerService::new(
        config.pipeline.clone(),
        Arc::new(DirectlyFollowsMiner::new()),
        store,
    ));

    let bootstrapped = service.bootstrap_from_store().await;
    info!(logs = bootstrapped, "bootstrapped logs from event store");

    let schedulers = service.spawn_schedulers();

    let app = create_router(Arc::new(AppState::new(service)));
    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(address = %address, "miner server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    schedulers.abort();
    info!("miner server stopped");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "process_miner=info,miner_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
