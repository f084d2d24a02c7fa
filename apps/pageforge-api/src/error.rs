//! Error types for the PageForge API

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pageforge_core::PageForgeError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Engine(#[from] PageForgeError),

    #[error("Result not found: {0}")]
    ResultNotFound(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::InvalidRequest(format!("Malformed multipart request: {}", e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, code) = match &self {
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            ApiError::Engine(PageForgeError::PasswordRequired) => (
                StatusCode::BAD_REQUEST,
                "Document is password-protected".to_string(),
                Some("password_required"),
            ),
            ApiError::Engine(PageForgeError::Operation(e)) => {
                tracing::error!("PDF operation failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PDF operation failed".to_string(),
                    None,
                )
            }
            ApiError::Engine(e) => (StatusCode::BAD_REQUEST, e.to_string(), None),
            ApiError::ResultNotFound(id) => (
                StatusCode::NOT_FOUND,
                format!("Result not found: {}", id),
                None,
            ),
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                    None,
                )
            }
        };

        let mut body = json!({
            "error": message,
            "status": status.as_u16(),
        });
        if let Some(code) = code {
            body["code"] = json!(code);
        }

        (status, Json(body)).into_response()
    }
}
