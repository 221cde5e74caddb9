//! Model information handler

use axum::{extract::State, Json};
use drugclf_core::ModelInfo;

use crate::{AppResult, AppState};

pub async fn info(State(state): State<AppState>) -> AppResult<Json<ModelInfo>> {
    Ok(Json(state.lifecycle.model_info()?))
}
