//! In-process [`Store`] driven by the static table schemas.
//!
//! Behaves like the hosted store for everything this crate relies on:
//! generated `id`/`created_at` columns, unknown-column and not-null
//! rejection, natural-key uniqueness, and the "not exactly one row" signal
//! on single selects.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{Filter, Order, Store};
use crate::{
    models::{Identity, Table, CREATED_AT, ID},
    DbError,
};

type Row = Map<String, Value>;

#[derive(Default)]
struct Tables {
    rows: HashMap<&'static str, Vec<Row>>,
    last_created_at: Option<DateTime<Utc>>,
}

impl Tables {
    /// Next creation timestamp, strictly later than every one handed out so far.
    fn next_created_at(&mut self) -> DateTime<Utc> {
        let now = Utc::now().trunc_subsecs(6);
        let ts = match self.last_created_at {
            Some(prev) if now <= prev => prev + Duration::microseconds(1),
            _ => now,
        };
        self.last_created_at = Some(ts);
        ts
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently held for `table`.
    pub fn len(&self, table: &Table) -> usize {
        self.lock().rows.get(table.name).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, table: &Table) -> bool {
        self.len(table) == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn persistence(code: &str, message: String) -> DbError {
    DbError::from_store(Some(code.to_owned()), message)
}

fn as_object(table: &Table, value: Value) -> Result<Row, DbError> {
    match value {
        Value::Object(row) => Ok(row),
        other => Err(persistence(
            "PGRST102",
            format!("expected a JSON object for '{}', got {other}", table.name),
        )),
    }
}

fn check_columns(table: &Table, row: &Row) -> Result<(), DbError> {
    match row.keys().find(|column| !table.has_column(column)) {
        Some(column) => Err(persistence(
            "PGRST204",
            format!(
                "Could not find the '{column}' column of '{}' in the schema cache",
                table.name
            ),
        )),
        None => Ok(()),
    }
}

fn check_filter(table: &Table, filter: &Filter) -> Result<(), DbError> {
    if table.has_column(&filter.column) {
        Ok(())
    } else {
        Err(persistence(
            "42703",
            format!("column {}.{} does not exist", table.name, filter.column),
        ))
    }
}

fn not_null_violation(table: &Table, column: &str) -> DbError {
    persistence(
        "23502",
        format!(
            "null value in column \"{column}\" of relation \"{}\" violates not-null constraint",
            table.name
        ),
    )
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(a), Some(b)) => a.to_string().cmp(&b.to_string()),
        // Nulls sort last, as in Postgres ascending order.
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

fn project(row: &Row, columns: &str) -> Value {
    if columns.trim() == "*" {
        return Value::Object(row.clone());
    }
    let projected = columns
        .split(',')
        .map(str::trim)
        .filter_map(|column| row.get(column).map(|v| (column.to_owned(), v.clone())))
        .collect();
    Value::Object(projected)
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert(&self, table: &Table, row: Value) -> Result<Value, DbError> {
        let mut row = as_object(table, row)?;
        check_columns(table, &row)?;

        for column in table.required {
            if row.get(*column).map_or(true, Value::is_null) {
                return Err(not_null_violation(table, column));
            }
        }
        for column in table.optional {
            row.entry(*column).or_insert(Value::Null);
        }

        let mut tables = self.lock();

        if let Identity::Natural(key) = table.identity {
            let rows = tables.rows.get(table.name).map(Vec::as_slice).unwrap_or_default();
            if rows.iter().any(|existing| existing.get(key) == row.get(key)) {
                return Err(DbError::UniqueViolation(format!(
                    "duplicate key value violates unique constraint \"{}_pkey\"",
                    table.name
                )));
            }
        }

        if table.identity == Identity::Generated && !row.contains_key(ID) {
            row.insert(ID.to_owned(), Value::String(Uuid::new_v4().to_string()));
        }
        if !row.contains_key(CREATED_AT) {
            let ts = tables.next_created_at();
            row.insert(
                CREATED_AT.to_owned(),
                Value::String(ts.to_rfc3339_opts(SecondsFormat::Micros, true)),
            );
        }

        tables.rows.entry(table.name).or_default().push(row.clone());
        Ok(Value::Object(row))
    }

    async fn select_single(
        &self,
        table: &Table,
        columns: &str,
        filter: &Filter,
    ) -> Result<Value, DbError> {
        check_filter(table, filter)?;
        let tables = self.lock();
        let mut matches = tables
            .rows
            .get(table.name)
            .into_iter()
            .flatten()
            .filter(|row| filter.matches(row));

        match (matches.next(), matches.next()) {
            (Some(row), None) => Ok(project(row, columns)),
            _ => Err(DbError::NotFound),
        }
    }

    async fn select_all(&self, table: &Table, order: &Order) -> Result<Vec<Value>, DbError> {
        let mut rows: Vec<Row> = self
            .lock()
            .rows
            .get(table.name)
            .cloned()
            .unwrap_or_default();

        rows.sort_by(|a, b| {
            let ord = compare(a.get(&order.column), b.get(&order.column));
            if order.descending {
                ord.reverse()
            } else {
                ord
            }
        });
        Ok(rows.into_iter().map(Value::Object).collect())
    }

    async fn update(
        &self,
        table: &Table,
        filter: &Filter,
        patch: Value,
    ) -> Result<Vec<Value>, DbError> {
        check_filter(table, filter)?;
        let patch = as_object(table, patch)?;
        check_columns(table, &patch)?;
        if let Some((column, _)) = patch
            .iter()
            .find(|(column, value)| value.is_null() && table.required.contains(&column.as_str()))
        {
            return Err(not_null_violation(table, column));
        }

        let mut tables = self.lock();
        let rows = tables.rows.entry(table.name).or_default();
        let mut updated = Vec::new();
        for row in rows.iter_mut().filter(|row| filter.matches(row)) {
            for (column, value) in &patch {
                row.insert(column.clone(), value.clone());
            }
            updated.push(Value::Object(row.clone()));
        }
        Ok(updated)
    }

    async fn delete(&self, table: &Table, filter: &Filter) -> Result<(), DbError> {
        check_filter(table, filter)?;
        if let Some(rows) = self.lock().rows.get_mut(table.name) {
            rows.retain(|row| !filter.matches(row));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::{CONTACT_MESSAGES, NEWSLETTER_SUBSCRIPTIONS};

    fn contact(first_name: &str) -> Value {
        json!({
            "first_name": first_name,
            "last_name": "B",
            "email": "a@b.com",
            "phone": "123",
            "message": "hi"
        })
    }

    #[tokio::test]
    async fn insert_fills_generated_and_optional_columns() {
        let store = MemoryStore::new();
        let row = store.insert(&CONTACT_MESSAGES, contact("A")).await.unwrap();

        assert!(Uuid::parse_str(row["id"].as_str().unwrap()).is_ok());
        assert!(row[CREATED_AT].is_string());
        assert!(row["course_interest"].is_null());
        assert_eq!(store.len(&CONTACT_MESSAGES), 1);
    }

    #[tokio::test]
    async fn unknown_columns_are_rejected() {
        let store = MemoryStore::new();
        let mut body = contact("A");
        body["favourite_colour"] = json!("teal");

        let err = store.insert(&CONTACT_MESSAGES, body).await.unwrap_err();
        assert!(matches!(err, DbError::Persistence { ref code, .. } if code.as_deref() == Some("PGRST204")));
        assert!(store.is_empty(&CONTACT_MESSAGES));
    }

    #[tokio::test]
    async fn missing_required_column_violates_not_null() {
        let store = MemoryStore::new();
        let err = store
            .insert(&CONTACT_MESSAGES, json!({ "first_name": "A" }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("\"last_name\""));
    }

    #[tokio::test]
    async fn natural_key_is_unique() {
        let store = MemoryStore::new();
        let row = json!({ "email": "x@y.com" });
        store.insert(&NEWSLETTER_SUBSCRIPTIONS, row.clone()).await.unwrap();

        let err = store.insert(&NEWSLETTER_SUBSCRIPTIONS, row).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn created_at_is_strictly_increasing() {
        let store = MemoryStore::new();
        let mut previous = String::new();
        for name in ["a", "b", "c", "d"] {
            let row = store.insert(&CONTACT_MESSAGES, contact(name)).await.unwrap();
            let ts = row[CREATED_AT].as_str().unwrap().to_owned();
            assert!(ts > previous, "{ts} should be after {previous}");
            previous = ts;
        }
    }

    #[tokio::test]
    async fn select_single_requires_exactly_one_match() {
        let store = MemoryStore::new();
        let filter = Filter::eq("email", "a@b.com");
        assert!(matches!(
            store.select_single(&CONTACT_MESSAGES, "*", &filter).await,
            Err(DbError::NotFound)
        ));

        store.insert(&CONTACT_MESSAGES, contact("A")).await.unwrap();
        let row = store
            .select_single(&CONTACT_MESSAGES, "first_name, email", &filter)
            .await
            .unwrap();
        assert_eq!(row, json!({ "first_name": "A", "email": "a@b.com" }));

        store.insert(&CONTACT_MESSAGES, contact("B")).await.unwrap();
        assert!(matches!(
            store.select_single(&CONTACT_MESSAGES, "*", &filter).await,
            Err(DbError::NotFound)
        ));
    }

    #[tokio::test]
    async fn update_replaces_only_patched_columns() {
        let store = MemoryStore::new();
        store.insert(&CONTACT_MESSAGES, contact("A")).await.unwrap();

        let updated = store
            .update(
                &CONTACT_MESSAGES,
                &Filter::eq("first_name", "A"),
                json!({ "course_interest": "Rust" }),
            )
            .await
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0]["course_interest"], "Rust");
        assert_eq!(updated[0]["message"], "hi");

        let err = store
            .update(&CONTACT_MESSAGES, &Filter::eq("first_name", "A"), json!({ "message": null }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not-null"));
    }

    #[tokio::test]
    async fn delete_with_unknown_column_fails() {
        let store = MemoryStore::new();
        let err = store
            .delete(&NEWSLETTER_SUBSCRIPTIONS, &Filter::eq("id", "1"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
