//! Request extractors

use axum::extract::FromRequest;

use crate::AppError;

/// `Json` whose rejections answer with the service's error body
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
