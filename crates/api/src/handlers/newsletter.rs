use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::Value;
use tracing::info;

use db::{
    models::{NewsletterSubscription, NEWSLETTER_SUBSCRIPTIONS},
    repository, DbError,
};

use super::forms::Resource;
use crate::{ApiError, AppState, Envelope};

pub const ALREADY_SUBSCRIBED: &str = "This email is already subscribed to our newsletter";
const UNSUBSCRIBE_FAILURE: &str = "Failed to unsubscribe from newsletter";

/// Subscribe the body's `email`, answering 409 if it is already on the list.
///
/// The existence check and the insert are two separate store calls; a
/// unique constraint in the store turns a lost race into the same 409.
/// A failed existence check answers 500 and no insert is attempted.
pub async fn subscribe(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Envelope<Value>>, ApiError> {
    let Json(body) = body?;
    let store = state.store.as_ref();
    let failure = NewsletterSubscription::SUBMIT_FAILURE;

    if let Some(email) = body.get("email").and_then(Value::as_str) {
        let exists = repository::subscription_exists(store, email)
            .await
            .map_err(|e| ApiError::from_db(e, failure))?;
        if exists {
            return Err(ApiError::Conflict(ALREADY_SUBSCRIBED.into()));
        }
    }

    match repository::create_raw(store, &NEWSLETTER_SUBSCRIPTIONS, body).await {
        Ok(row) => Ok(Json(Envelope::ok(row))),
        Err(DbError::UniqueViolation(msg)) => {
            info!("newsletter insert hit the unique constraint: {}", msg);
            Err(ApiError::Conflict(ALREADY_SUBSCRIBED.into()))
        }
        Err(e) => Err(ApiError::from_db(e, failure)),
    }
}

/// Remove every subscription for the body's `email`.
pub async fn unsubscribe(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<Json<Envelope<()>>, ApiError> {
    let email = body
        .as_ref()
        .and_then(|Json(body)| body.get("email"))
        .and_then(Value::as_str);

    repository::unsubscribe(state.store.as_ref(), email)
        .await
        .map(|()| Json(Envelope::done()))
        .map_err(|e| ApiError::from_db(e, UNSUBSCRIBE_FAILURE))
}
