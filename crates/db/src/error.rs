//! Typed error type for the db crate.

use thiserror::Error;

/// PostgREST code for "JSON object requested, multiple (or no) rows returned".
pub const NO_ROWS_CODE: &str = "PGRST116";

/// Postgres SQLSTATE for `unique_violation`.
pub const UNIQUE_VIOLATION_CODE: &str = "23505";

#[derive(Debug, Error)]
pub enum DbError {
    /// The store rejected or failed the operation.
    #[error("{message}")]
    Persistence {
        code: Option<String>,
        message: String,
    },

    #[error("row not found")]
    NotFound,

    /// The store refused a row because a unique constraint already holds it.
    #[error("{0}")]
    UniqueViolation(String),

    /// Caller-supplied data is missing or malformed.
    #[error("{0}")]
    Validation(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed row: {0}")]
    Decode(#[from] serde_json::Error),
}

impl DbError {
    /// Build an error from a store error `code` and `message`, mapping the
    /// codes this layer distinguishes onto their own variants.
    pub fn from_store(code: Option<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        match code.as_deref() {
            Some(NO_ROWS_CODE) => Self::NotFound,
            Some(UNIQUE_VIOLATION_CODE) => Self::UniqueViolation(message),
            _ => Self::Persistence { code, message },
        }
    }

    /// `true` when the store itself produced the error (as opposed to the
    /// network or a malformed response).
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            Self::Persistence { .. } | Self::UniqueViolation(_) | Self::NotFound
        )
    }
}
