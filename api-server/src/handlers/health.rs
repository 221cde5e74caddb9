//! Health check and service index

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    model_loaded: bool,
    model_path: String,
    run_id: Option<String>,
    dataset_rows: usize,
    version: &'static str,
    timestamp: i64,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let health = state.lifecycle.health();

    Json(HealthResponse {
        status: if health.model_loaded { "healthy" } else { "unhealthy" },
        model_loaded: health.model_loaded,
        model_path: health.model_path.display().to_string(),
        run_id: health.run_id.map(|id| id.to_string()),
        dataset_rows: health.dataset_rows,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
    })
}

pub async fn index() -> Json<Value> {
    Json(json!({
        "message": "Drug Classification API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/health",
            "predict": "/predict (POST)",
            "retrain": "/retrain (POST)",
            "model_info": "/model/info"
        }
    }))
}
