//! `client` crate: data access for code running with the anonymous key.
//!
//! Mirrors the server's table operations through [`SiteClient`] and passes
//! sign-up / sign-in / sign-out / current-user straight through to the
//! store's auth API via [`AuthClient`].  No session policy lives here beyond
//! remembering the last session the provider handed out.

pub mod auth;
pub mod error;
pub mod forms;

pub use auth::{AuthClient, AuthResponse, Session, User};
pub use error::{AuthError, ClientError};
pub use forms::SiteClient;
