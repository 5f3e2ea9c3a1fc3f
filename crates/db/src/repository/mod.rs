//! Repository functions: one generic helper per table operation.
//!
//! Every function takes a `&dyn Store` and returns a `Result<T, DbError>`.
//! Which credential the store carries is decided by the caller.

pub mod entities;
pub mod newsletter;

pub use entities::{create, create_raw, list, list_raw, update};
pub use newsletter::{subscription_exists, unsubscribe};
