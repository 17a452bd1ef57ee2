//! API error type mapping engine-side failures onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::rank::profile::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Query boundary violation; the request never reaches the engine.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(err) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
            ApiError::Internal(err) => {
                // Log the chain but never leak it to the client.
                error!(error = ?err, "internal error while serving request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
