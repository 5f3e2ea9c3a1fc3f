//! Generic create / list / update operations for every [`Entity`].

use serde_json::Value;
use tracing::debug;

use crate::{
    models::{Entity, Table, CREATED_AT},
    store::{Filter, Order, Store},
    DbError,
};

/// Insert a typed row and return it as persisted.
pub async fn create<E: Entity>(store: &dyn Store, input: &E::Insert) -> Result<E, DbError> {
    let payload = serde_json::to_value(input)?;
    let row = create_raw(store, E::TABLE, payload).await?;
    Ok(serde_json::from_value(row)?)
}

/// Insert an arbitrary JSON body into `table`.
///
/// No field allow-listing happens here; the store's schema rejects unknown
/// columns.
pub async fn create_raw(store: &dyn Store, table: &Table, payload: Value) -> Result<Value, DbError> {
    debug!(table = table.name, "creating row");
    store.insert(table, payload).await
}

/// Return all rows ordered by creation time (newest first).
pub async fn list<E: Entity>(store: &dyn Store) -> Result<Vec<E>, DbError> {
    list_raw(store, E::TABLE)
        .await?
        .into_iter()
        .map(|row| serde_json::from_value(row).map_err(DbError::from))
        .collect()
}

/// Untyped variant of [`list`].
pub async fn list_raw(store: &dyn Store, table: &Table) -> Result<Vec<Value>, DbError> {
    debug!(table = table.name, "listing rows");
    store.select_all(table, &Order::desc(CREATED_AT)).await
}

/// Overwrite the columns set in `patch` on every row matching `filter`.
pub async fn update<E: Entity>(
    store: &dyn Store,
    filter: &Filter,
    patch: &E::Update,
) -> Result<Vec<E>, DbError> {
    debug!(table = E::TABLE.name, column = %filter.column, "updating rows");
    let patch = serde_json::to_value(patch)?;
    store
        .update(E::TABLE, filter, patch)
        .await?
        .into_iter()
        .map(|row| serde_json::from_value(row).map_err(DbError::from))
        .collect()
}
