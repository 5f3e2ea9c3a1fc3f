//! Create and list handlers shared by every form table.
//!
//! Request bodies are forwarded to the store as-is; the store's schema is
//! the only field validation.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::Value;

use db::{
    models::{ContactMessage, CourseApplication, DemoApplication, EventRegistration, NewsletterSubscription},
    repository, Entity,
};

use crate::{ApiError, AppState, Envelope};

/// An entity exposed over HTTP, with the messages shown when a request fails
/// for reasons other than a store rejection.
pub trait Resource: Entity {
    const SUBMIT_FAILURE: &'static str;
    const FETCH_FAILURE: &'static str;
}

impl Resource for ContactMessage {
    const SUBMIT_FAILURE: &'static str = "Failed to submit contact message";
    const FETCH_FAILURE: &'static str = "Failed to fetch contact messages";
}

impl Resource for CourseApplication {
    const SUBMIT_FAILURE: &'static str = "Failed to submit course application";
    const FETCH_FAILURE: &'static str = "Failed to fetch course applications";
}

impl Resource for DemoApplication {
    const SUBMIT_FAILURE: &'static str = "Failed to submit demo application";
    const FETCH_FAILURE: &'static str = "Failed to fetch demo applications";
}

impl Resource for NewsletterSubscription {
    const SUBMIT_FAILURE: &'static str = "Failed to subscribe to newsletter";
    const FETCH_FAILURE: &'static str = "Failed to fetch newsletter subscriptions";
}

impl Resource for EventRegistration {
    const SUBMIT_FAILURE: &'static str = "Failed to submit event registration";
    const FETCH_FAILURE: &'static str = "Failed to fetch event registrations";
}

pub async fn create<R: Resource>(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Envelope<Value>>, ApiError> {
    let Json(body) = body?;
    repository::create_raw(state.store.as_ref(), R::TABLE, body)
        .await
        .map(|row| Json(Envelope::ok(row)))
        .map_err(|e| ApiError::from_db(e, R::SUBMIT_FAILURE))
}

pub async fn list<R: Resource>(
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<Value>>>, ApiError> {
    repository::list_raw(state.store.as_ref(), R::TABLE)
        .await
        .map(|rows| Json(Envelope::ok(rows)))
        .map_err(|e| ApiError::from_db(e, R::FETCH_FAILURE))
}
