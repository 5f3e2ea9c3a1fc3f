//! The `Store` trait: the contract every backing store must fulfil.
//!
//! The hosted store is reached over HTTP ([`RestStore`]); tests and local
//! development run against [`MemoryStore`].  Rows cross this seam as JSON
//! objects so route handlers can forward request bodies untouched.

pub mod memory;
pub mod rest;

use async_trait::async_trait;
use serde_json::Value;

use crate::{models::Table, DbError};

pub use memory::MemoryStore;
pub use rest::RestStore;

/// Column equality filter (`column = value`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// `true` if `row` holds exactly this value in the filtered column.
    pub fn matches(&self, row: &serde_json::Map<String, Value>) -> bool {
        row.get(&self.column).and_then(Value::as_str) == Some(self.value.as_str())
    }
}

/// Sort order for [`Store::select_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub descending: bool,
}

impl Order {
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }

    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }
}

/// Table operations offered by the backing store.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a single row and return it as persisted (generated columns
    /// included).
    async fn insert(&self, table: &Table, row: Value) -> Result<Value, DbError>;

    /// Fetch exactly one row matching `filter`, projected onto `columns`
    /// (`"*"` for all).
    ///
    /// # Errors
    /// [`DbError::NotFound`] unless exactly one row matches.
    async fn select_single(
        &self,
        table: &Table,
        columns: &str,
        filter: &Filter,
    ) -> Result<Value, DbError>;

    /// Fetch every row of the table in the given order.
    async fn select_all(&self, table: &Table, order: &Order) -> Result<Vec<Value>, DbError>;

    /// Overwrite the columns present in `patch` on every matching row and
    /// return the updated rows.
    async fn update(
        &self,
        table: &Table,
        filter: &Filter,
        patch: Value,
    ) -> Result<Vec<Value>, DbError>;

    /// Delete every row matching `filter`.  Matching nothing is not an error.
    async fn delete(&self, table: &Table, filter: &Filter) -> Result<(), DbError>;
}
