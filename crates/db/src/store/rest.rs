//! HTTP client for the hosted store's REST interface (PostgREST dialect).
//!
//! One `RestStore` is bound to a base URL and a single API key.  Whether that
//! key is the anonymous key or the privileged service-role key is the
//! caller's decision; the server side must never hand the latter to a
//! browser.

use async_trait::async_trait;
use reqwest::{header, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::{Filter, Order, Store};
use crate::{models::Table, DbError};

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const RETURN_REPRESENTATION: &str = "return=representation";
const RETURN_MINIMAL: &str = "return=minimal";

/// Error body returned by the store.
#[derive(Debug, Deserialize)]
struct StoreErrorBody {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Clone)]
pub struct RestStore {
    base_url: String,
    key: String,
    http: reqwest::Client,
}

impl std::fmt::Debug for RestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestStore")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl RestStore {
    /// Create a store client for `base_url` authenticated with `key`.
    pub fn new(base_url: impl Into<String>, key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        info!("Using REST store at {}", base_url);
        Self {
            base_url,
            key: key.into(),
            http: reqwest::Client::new(),
        }
    }

    fn request(&self, method: Method, table: &Table) -> RequestBuilder {
        let url = format!("{}/rest/v1/{}", self.base_url, table.name);
        self.http
            .request(method, url)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
    }

    async fn send(request: RequestBuilder) -> Result<Response, DbError> {
        let response = request.send().await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response).await)
        }
    }
}

/// Turn a non-2xx response into a [`DbError`], keeping the store's message.
async fn error_from_response(response: Response) -> DbError {
    let status = response.status();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return DbError::Transport(e),
    };

    match serde_json::from_str::<StoreErrorBody>(&body) {
        Ok(StoreErrorBody { code, message: Some(message) }) => DbError::from_store(code, message),
        Ok(StoreErrorBody { code, message: None }) => {
            DbError::from_store(code, format!("store returned {status}"))
        }
        Err(_) if body.is_empty() => DbError::from_store(None, format!("store returned {status}")),
        Err(_) => DbError::from_store(None, body),
    }
}

fn filter_param(filter: &Filter) -> [(String, String); 1] {
    [(filter.column.clone(), format!("eq.{}", filter.value))]
}

fn order_param(order: &Order) -> String {
    let direction = if order.descending { "desc" } else { "asc" };
    format!("{}.{}", order.column, direction)
}

#[async_trait]
impl Store for RestStore {
    async fn insert(&self, table: &Table, row: Value) -> Result<Value, DbError> {
        debug!(table = table.name, "POST insert");
        let request = self
            .request(Method::POST, table)
            .header("Prefer", RETURN_REPRESENTATION)
            .header(header::ACCEPT, SINGLE_OBJECT)
            .json(&row);
        Ok(Self::send(request).await?.json().await?)
    }

    async fn select_single(
        &self,
        table: &Table,
        columns: &str,
        filter: &Filter,
    ) -> Result<Value, DbError> {
        debug!(table = table.name, column = %filter.column, "GET single");
        let request = self
            .request(Method::GET, table)
            .header(header::ACCEPT, SINGLE_OBJECT)
            .query(&[("select", columns)])
            .query(&filter_param(filter));
        Ok(Self::send(request).await?.json().await?)
    }

    async fn select_all(&self, table: &Table, order: &Order) -> Result<Vec<Value>, DbError> {
        debug!(table = table.name, "GET all");
        let request = self
            .request(Method::GET, table)
            .query(&[("select", "*".to_owned()), ("order", order_param(order))]);
        Ok(Self::send(request).await?.json().await?)
    }

    async fn update(
        &self,
        table: &Table,
        filter: &Filter,
        patch: Value,
    ) -> Result<Vec<Value>, DbError> {
        debug!(table = table.name, column = %filter.column, "PATCH");
        let request = self
            .request(Method::PATCH, table)
            .header("Prefer", RETURN_REPRESENTATION)
            .query(&filter_param(filter))
            .json(&patch);
        Ok(Self::send(request).await?.json().await?)
    }

    async fn delete(&self, table: &Table, filter: &Filter) -> Result<(), DbError> {
        debug!(table = table.name, column = %filter.column, "DELETE");
        let request = self
            .request(Method::DELETE, table)
            .header("Prefer", RETURN_MINIMAL)
            .query(&filter_param(filter));
        Self::send(request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::{
        extract::{Path, Query},
        http::{HeaderMap, StatusCode},
        routing::get,
        Json, Router,
    };
    use serde_json::json;

    use super::*;
    use crate::models::{CONTACT_MESSAGES, CREATED_AT, NEWSLETTER_SUBSCRIPTIONS};

    const KEY: &str = "service-role-key";

    fn authorised(headers: &HeaderMap) -> bool {
        headers.get("apikey").and_then(|v| v.to_str().ok()) == Some(KEY)
            && headers.get("authorization").and_then(|v| v.to_str().ok())
                == Some(&*format!("Bearer {KEY}"))
    }

    fn not_found() -> (StatusCode, Json<Value>) {
        (
            StatusCode::NOT_ACCEPTABLE,
            Json(json!({
                "code": "PGRST116",
                "details": "The result contains 0 rows",
                "hint": null,
                "message": "JSON object requested, multiple (or no) rows returned"
            })),
        )
    }

    async fn insert(
        Path(table): Path<String>,
        headers: HeaderMap,
        Json(mut row): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        if !authorised(&headers) {
            return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Invalid API key" })));
        }
        let prefer = headers.get("prefer").and_then(|v| v.to_str().ok()).unwrap_or_default();
        if !prefer.contains("return=representation") {
            return (StatusCode::CREATED, Json(Value::Null));
        }
        if row.get("email") == Some(&json!("taken@example.com")) {
            return (
                StatusCode::CONFLICT,
                Json(json!({
                    "code": "23505",
                    "message": "duplicate key value violates unique constraint \"newsletter_subscriptions_pkey\""
                })),
            );
        }
        if row.get("bogus").is_some() {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "code": "PGRST204",
                    "message": format!("Could not find the 'bogus' column of '{table}' in the schema cache")
                })),
            );
        }
        row["id"] = json!("7f0c2c4e-2a52-4d3f-9a55-0d8c1f6b8f10");
        row[CREATED_AT] = json!("2024-05-01T10:00:00.000000Z");
        (StatusCode::CREATED, Json(row))
    }

    async fn select(
        headers: HeaderMap,
        Query(params): Query<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        if !authorised(&headers) {
            return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Invalid API key" })));
        }
        let single = headers.get("accept").and_then(|v| v.to_str().ok()) == Some(SINGLE_OBJECT);
        if single {
            return match params.get("email").map(String::as_str) {
                Some("eq.known@example.com") if params.get("select").map(String::as_str) == Some("email") => {
                    (StatusCode::OK, Json(json!({ "email": "known@example.com" })))
                }
                _ => not_found(),
            };
        }
        match params.get("order").map(String::as_str) {
            Some("created_at.desc") => (
                StatusCode::OK,
                Json(json!([
                    { "email": "b@example.com", "created_at": "2024-05-02T00:00:00Z" },
                    { "email": "a@example.com", "created_at": "2024-05-01T00:00:00Z" }
                ])),
            ),
            _ => (StatusCode::BAD_REQUEST, Json(json!({ "message": "bad order" }))),
        }
    }

    async fn delete(
        headers: HeaderMap,
        Query(params): Query<HashMap<String, String>>,
    ) -> StatusCode {
        if authorised(&headers) && params.contains_key("email") {
            StatusCode::NO_CONTENT
        } else {
            StatusCode::BAD_REQUEST
        }
    }

    async fn spawn_fake_store() -> String {
        let app = Router::new().route(
            "/rest/v1/:table",
            get(select).post(insert).delete(delete),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn insert_returns_the_persisted_row() {
        let store = RestStore::new(spawn_fake_store().await, KEY);
        let row = store
            .insert(&CONTACT_MESSAGES, json!({ "first_name": "A", "course_interest": null }))
            .await
            .expect("insert should succeed");

        assert_eq!(row["first_name"], "A");
        assert!(row["id"].is_string());
        assert!(row["course_interest"].is_null());
    }

    #[tokio::test]
    async fn store_messages_are_carried_through() {
        let store = RestStore::new(spawn_fake_store().await, KEY);
        let err = store
            .insert(&CONTACT_MESSAGES, json!({ "bogus": 1 }))
            .await
            .unwrap_err();

        match err {
            DbError::Persistence { code, message } => {
                assert_eq!(code.as_deref(), Some("PGRST204"));
                assert!(message.contains("'bogus' column"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unique_violation_is_distinguished() {
        let store = RestStore::new(spawn_fake_store().await, KEY);
        let err = store
            .insert(&NEWSLETTER_SUBSCRIPTIONS, json!({ "email": "taken@example.com" }))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn zero_rows_surfaces_not_found() {
        let store = RestStore::new(spawn_fake_store().await, KEY);
        let hit = store
            .select_single(
                &NEWSLETTER_SUBSCRIPTIONS,
                "email",
                &Filter::eq("email", "known@example.com"),
            )
            .await
            .expect("row should be found");
        assert_eq!(hit["email"], "known@example.com");

        let miss = store
            .select_single(
                &NEWSLETTER_SUBSCRIPTIONS,
                "email",
                &Filter::eq("email", "nobody@example.com"),
            )
            .await;
        assert!(matches!(miss, Err(DbError::NotFound)));
    }

    #[tokio::test]
    async fn select_all_requests_descending_order() {
        let store = RestStore::new(spawn_fake_store().await, KEY);
        let rows = store
            .select_all(&NEWSLETTER_SUBSCRIPTIONS, &Order::desc(CREATED_AT))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["email"], "b@example.com");
    }

    #[tokio::test]
    async fn delete_succeeds_on_no_content() {
        let store = RestStore::new(spawn_fake_store().await, KEY);
        store
            .delete(&NEWSLETTER_SUBSCRIPTIONS, &Filter::eq("email", "a@example.com"))
            .await
            .expect("delete should succeed");
    }

    #[tokio::test]
    async fn wrong_key_is_a_persistence_error() {
        let store = RestStore::new(spawn_fake_store().await, "anon-key");
        let err = store
            .select_all(&NEWSLETTER_SUBSCRIPTIONS, &Order::desc(CREATED_AT))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid API key");
    }
}
