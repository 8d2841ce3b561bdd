//! HTTP-facing error type.
//!
//! Domain and component errors converge here and come out as JSON
//! `{"error": ...}` bodies with the matching status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use bundle::BundleError;
use deploy::{AuthError, StoreError};
use publisher::PublishError;

/// Error answered to an API caller.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No usable `Authorization: Bearer ...` header on the request.
    #[error("missing or malformed authorization header")]
    MissingAuth,

    /// The identity provider rejected the presented token.
    #[error("invalid or expired token")]
    InvalidToken,

    /// The request was understood but its content is unusable.
    #[error("{0}")]
    BadRequest(String),

    /// The request body exceeds the configured upload limit.
    #[error("upload exceeds the maximum allowed size")]
    PayloadTooLarge,

    /// The request conflicts with existing state (duplicate game name).
    #[error("{0}")]
    Conflict(String),

    /// Something on our side failed.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::MissingAuth | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken => Self::InvalidToken,
            AuthError::Transport { .. } => Self::Internal(err.to_string()),
        }
    }
}

impl From<BundleError> for ApiError {
    fn from(err: BundleError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<PublishError> for ApiError {
    fn from(err: PublishError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateName => Self::Conflict(err.to_string()),
            _ => Self::Internal(err.to_string()),
        }
    }
}
