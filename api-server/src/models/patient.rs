//! Prediction DTOs

use drugclf_core::RawPatient;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub prediction: String,
    /// Echo of the request body
    pub patient_data: RawPatient,
    pub status: &'static str,
}
