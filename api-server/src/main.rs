//! Drug Classification API Server
//!
//! REST front end over the drug classification core: prediction with the
//! active model, retraining with new hyperparameters, model metadata.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  DRUGCLF API SERVER                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌────────────────┐  ┌───────────────────┐  │
//! │  │  Router   │─▶│ ModelLifecycle │─▶│ spawn_blocking    │  │
//! │  │  (Axum)   │  │ (Arc snapshot) │  │ (retrain)         │  │
//! │  └───────────┘  └───────┬────────┘  └─────────┬─────────┘  │
//! │                         ▼                     ▼            │
//! │                ┌──────────────────────────────────┐        │
//! │                │ models/random_forest_model.json  │        │
//! │                └──────────────────────────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod extract;
mod handlers;
mod models;


use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use drugclf_core::{logic::dataset, ModelLifecycle};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging (JSON lines in production)
    let production = config.is_production();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "drugclf_server=debug,drugclf_core=info,tower_http=debug".into()))
        .with(production.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!production).then(tracing_subscriber::fmt::layer))
        .init();

    tracing::info!("Drug Classification API starting ({})...", config.environment);

    let pipeline = &config.pipeline;
    let rows = match dataset::load_csv(&pipeline.data_path) {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!("Dataset unavailable ({}): /retrain will fail until it is provided", e);
            Vec::new()
        }
    };

    let lifecycle = Arc::new(ModelLifecycle::new(rows, pipeline.model_path.clone()));
    if let Err(e) = lifecycle.load() {
        tracing::warn!("No model loaded ({}): train with `drugclf train` or POST /retrain", e);
    }

    // Build application state
    let state = AppState {
        lifecycle,
        config: config.clone(),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {}", e);
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<ModelLifecycle>,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health::index))
        .route("/health", get(handlers::health::check))
        .route("/predict", post(handlers::predict::predict))
        .route("/retrain", post(handlers::retrain::retrain))
        .route("/model/info", get(handlers::model::info))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
