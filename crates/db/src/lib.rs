//! `db` crate: data access for the form-submission tables.
//!
//! Provides the [`Store`] seam (hosted REST store or in-memory), typed row
//! structs, and generic repository functions for every table.  No HTTP
//! routing lives here.

pub mod error;
pub mod models;
pub mod repository;
pub mod store;

pub use error::DbError;
pub use models::Entity;
pub use store::{Filter, MemoryStore, Order, RestStore, Store};
