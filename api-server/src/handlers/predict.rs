//! Prediction handler

use axum::{extract::State, Json};
use drugclf_core::RawPatient;

use crate::models::PredictionResponse;
use crate::extract::AppJson;
use crate::{AppResult, AppState};

/// Classify one patient with the active model
pub async fn predict(
    State(state): State<AppState>,
    AppJson(patient): AppJson<RawPatient>,
) -> AppResult<Json<PredictionResponse>> {
    let prediction = state.lifecycle.predict(&patient)?;
    tracing::debug!("Predicted {} for {:?}", prediction, patient);

    Ok(Json(PredictionResponse {
        prediction,
        patient_data: patient,
        status: "success",
    }))
}
