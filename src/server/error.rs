//! HTTP error mapping
//!
//! Every failure leaving a handler is an `ApiError`; the status code is
//! chosen per variant and the body is always `{"detail": "<message>"}`.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Detail message for any unknown item id
pub const NOT_FOUND_DETAIL: &str = "Item não encontrado";

/// Errors returned by the item handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Body, path or query failed validation; storage was never touched
    #[error("{0}")]
    Validation(String),

    #[error("Item não encontrado")]
    NotFound,

    /// Storage failure while creating; attributed to the request
    #[error("Erro ao criar item: {0}")]
    CreateFailed(crate::Error),

    /// Storage failure on any other operation
    #[error("Erro interno: {0}")]
    Internal(crate::Error),
}

impl ApiError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::CreateFailed(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            ApiError::Internal(e) => tracing::error!(error = %e, "Request failed"),
            ApiError::CreateFailed(e) => tracing::warn!(error = %e, "Create rejected"),
            ApiError::Validation(msg) => tracing::debug!(%msg, "Validation failed"),
            ApiError::NotFound => {}
        }

        let body = Json(ErrorResponse {
            detail: self.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}
