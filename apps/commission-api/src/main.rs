//! # Commission API
//!
//! HTTP server for the commission calculation engine.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Commission API Server                             │
//! │                                                                         │
//! │  Dashboard ───► HTTP (8900) ───► commission-engine ───► SQLite         │
//! │                                       │                                 │
//! │                                       ▼                                 │
//! │                               metrics feed file                         │
//! │                             (dealer-management export)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod metrics;
mod routes;
mod state;

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use commission_db::{Database, DbConfig};
use commission_engine::{CalculationEngine, DbPlanStore, DisputeService};

use crate::config::ApiConfig;
use crate::metrics::FeedFileMetrics;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("Starting commission API server");

    let config = ApiConfig::load()?;
    info!(
        port = config.http_port,
        database = %config.database_path,
        metrics_file = %config.metrics_file,
        "Configuration loaded"
    );

    let db = Database::new(DbConfig::new(&config.database_path)).await?;

    let engine = CalculationEngine::new(
        db.clone(),
        Arc::new(DbPlanStore::new(db.plans())),
        Arc::new(FeedFileMetrics::new(&config.metrics_file)),
    )
    .with_concurrency(config.worker_limit);
    let disputes =
        DisputeService::new(db.clone()).with_auto_resolution(config.auto_resolve_disputes);

    let app = routes::router(AppState {
        db,
        engine,
        disputes,
    });

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Commission API server stopped");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
