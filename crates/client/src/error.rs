//! Error types for the client crate.

use thiserror::Error;

use db::DbError;

/// Failure of a credential operation against the auth provider.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The provider answered with an error; `message` is the provider's text.
    #[error("{message}")]
    Provider { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Errors returned by [`crate::SiteClient`] data operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Caller-supplied data is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// The store rejected or failed the operation.
    #[error("{0}")]
    Persistence(String),
}

impl From<DbError> for ClientError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Validation(msg) => Self::Validation(msg),
            other => Self::Persistence(other.to_string()),
        }
    }
}
