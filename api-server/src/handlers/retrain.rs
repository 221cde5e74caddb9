//! Retrain handler

use std::sync::Arc;

use axum::{extract::State, Json};
use validator::Validate;

use crate::models::{RetrainRequest, RetrainResponse};
use crate::extract::AppJson;
use crate::{AppResult, AppState};

/// Retrain on the startup dataset and swap the active model.
///
/// Training is CPU-bound and runs on the blocking pool; if the client goes
/// away the retrain still completes.
pub async fn retrain(
    State(state): State<AppState>,
    AppJson(req): AppJson<RetrainRequest>,
) -> AppResult<Json<RetrainResponse>> {
    req.validate()?;
    let params = req.to_hyperparameters(&state.config.pipeline);

    tracing::info!(
        "Retrain requested: n_estimators={} max_leaf_nodes={} test_size={} apply_smote={}",
        req.n_estimators,
        req.max_leaf_nodes,
        req.test_size,
        req.apply_smote
    );

    let lifecycle = Arc::clone(&state.lifecycle);
    let (trained, evaluation) =
        tokio::task::spawn_blocking(move || lifecycle.retrain(&params)).await??;

    tracing::info!(
        "Model {} active, held-out accuracy {:.4}",
        trained.run_id,
        evaluation.accuracy
    );

    Ok(Json(RetrainResponse {
        status: "success",
        accuracy: evaluation.accuracy,
        evaluation,
        parameters: req,
        model_path: state.lifecycle.model_path().display().to_string(),
        run_id: trained.run_id.to_string(),
    }))
}
