//! Mapping of pipeline errors onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use comai_core::AppError;
use comai_rag::NOT_INITIALIZED;
use serde_json::json;

/// Error returned by route handlers. Body: `{"detail": "..."}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self.0 {
            err if err.is_client_error() => (StatusCode::BAD_REQUEST, err.to_string()),
            AppError::Uninitialized(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, NOT_INITIALIZED.to_string())
            }
            other => {
                tracing::error!("Unhandled request error: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong. Please try again.".to_string(),
                )
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
