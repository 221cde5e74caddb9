//! Error handling

use axum::{
    extract::rejection::JsonRejection,
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use drugclf_core::CoreError;
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Request errors
    ValidationError(String),
    EncodingError(String),
    TrainingError(String),

    // Model state
    ModelUnavailable,

    // Server-side errors
    SchemaError(String),
    PersistenceError(String),
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::ValidationError(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.as_str()),
            AppError::EncodingError(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.as_str()),
            AppError::TrainingError(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::ModelUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Model not loaded. Train one with `drugclf train` or POST /retrain",
            ),
            AppError::SchemaError(msg) => {
                tracing::error!("Schema error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Feature schema error")
            }
            AppError::PersistenceError(msg) => {
                tracing::error!("Persistence error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Model storage error occurred")
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => AppError::ValidationError(msg),
            CoreError::Encoding(msg) => AppError::EncodingError(msg),
            CoreError::Training(msg) => AppError::TrainingError(msg),
            CoreError::ModelUnavailable => AppError::ModelUnavailable,
            CoreError::Schema(msg) => AppError::SchemaError(msg),
            CoreError::Persistence(msg) => AppError::PersistenceError(msg),
        }
    }
}

/// Out-of-bounds hyperparameters in a request body
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::TrainingError(err.to_string())
    }
}

/// Malformed or mistyped JSON body
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalError(format!("background task failed: {}", err))
    }
}
