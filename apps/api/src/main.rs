mod ai;
mod auth;
mod config;
mod db;
mod enrichment;
mod errors;
mod faq;
mod games;
mod llm_client;
mod models;
mod ratings;
mod recommendations;
mod routes;
mod sessions;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::ai::LlmGameAi;
use crate::config::Config;
use crate::db::create_pool;
use crate::enrichment::{EnrichmentSettings, EnrichmentWorker};
use crate::enrichment::store::PgEnrichmentStore;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Gamenight API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url).await?;

    // Initialize LLM client and the game AI built on it
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    let ai: Arc<dyn ai::GameAi> = Arc::new(LlmGameAi::new(llm));

    // Request identity provider
    let users = auth::provider_from_config(config.use_dummy_auth);

    // Background enrichment worker with a shutdown channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = EnrichmentWorker::new(
        Arc::new(PgEnrichmentStore::new(db.clone())),
        ai.clone(),
        EnrichmentSettings {
            scan_interval: Duration::from_secs(config.enrichment_interval_secs),
            max_attempts: config.enrichment_max_attempts,
            retry_delay: Duration::from_secs(config.enrichment_retry_delay_secs),
        },
        shutdown_rx,
    );
    let worker_handle = tokio::spawn(worker.run());

    // Build app state and router
    let state = AppState {
        db,
        ai,
        users,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the worker and give it a bounded grace period to finish.
    info!("Shutting down enrichment worker");
    let _ = shutdown_tx.send(true);
    let grace = Duration::from_secs(config.shutdown_grace_secs);
    if tokio::time::timeout(grace, worker_handle).await.is_err() {
        warn!("Enrichment worker did not stop within {grace:?}; exiting anyway");
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => warn!("Failed to install SIGTERM handler: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
