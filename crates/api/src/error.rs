//! Route-level errors and the JSON envelope every response is wrapped in.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use db::DbError;

/// `{"success": true, "data": ...}` or `{"success": false, "error": "..."}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Success without a payload.
    pub fn done() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }
}

impl Envelope<()> {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Caller-supplied data is missing or malformed (400).
    #[error("{0}")]
    Validation(String),

    /// The submission duplicates an existing record (409).
    #[error("{0}")]
    Conflict(String),

    /// The store rejected the operation; the message is the store's (500).
    #[error("{0}")]
    Persistence(String),

    /// Anything else; only a generic message leaves the process (500).
    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    /// Log a data-layer failure and map it for the response.
    ///
    /// `fallback` is what the caller sees when the failure did not come from
    /// the store itself.
    pub fn from_db(err: DbError, fallback: &'static str) -> Self {
        error!("{}: {}", fallback, err);
        match err {
            DbError::Validation(msg) => Self::Validation(msg),
            err if err.is_store_error() => Self::Persistence(err.to_string()),
            _ => Self::Internal(fallback),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A body that is not JSON, or is not sent as JSON, is the caller's fault.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("rejected request body: {}", rejection.body_text());
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(Envelope::failed(self.to_string()))).into_response()
    }
}
