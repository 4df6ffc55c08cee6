//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors a handler can answer with
#[derive(Debug, Error)]
pub enum ApiError {
    /// Nothing to return (e.g., no tracks in the active playlist)
    #[error("{0}")]
    NotFound(String),

    /// Catalog source could not be reached
    #[error("{0}")]
    Unavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

pub(crate) fn no_tracks() -> ApiError {
    ApiError::NotFound("No tracks available".to_string())
}
