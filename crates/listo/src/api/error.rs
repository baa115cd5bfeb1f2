//! API error type.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::error;
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;

/// Errors surfaced to API clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Categorize a service-layer error by its message.
    ///
    /// The service layer reports domain failures as anyhow errors with
    /// stable message prefixes; this maps them onto HTTP statuses.
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        let msg = err.to_string();
        if msg.contains("not found") {
            ApiError::NotFound(msg)
        } else if msg.contains("authentication failed") {
            ApiError::Unauthorized(msg)
        } else if msg.contains("permission")
            || msg.contains("access")
            || msg.contains("only the owner")
        {
            ApiError::Forbidden(msg)
        } else if msg.contains("already registered")
            || msg.contains("already exists")
            || msg.contains("already a member")
        {
            ApiError::Conflict(msg)
        } else if msg.contains("invalid") || msg.contains("must be") || msg.contains("missing") {
            ApiError::BadRequest(msg)
        } else {
            ApiError::Internal(err)
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Internal(msg) => ApiError::Internal(anyhow::anyhow!(msg)),
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ApiError::Internal(err) => {
                error!("internal error: {err:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let body = Json(ErrorBody {
            error: self.to_string(),
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}
