//! Newsletter-specific operations keyed by the subscriber's email.

use tracing::debug;

use crate::{
    models::NEWSLETTER_SUBSCRIPTIONS,
    store::{Filter, Store},
    DbError,
};

/// `true` if `email` already has a subscription row.
///
/// The store's "no rows" signal means `false`; every other failure
/// propagates.
pub async fn subscription_exists(store: &dyn Store, email: &str) -> Result<bool, DbError> {
    debug!("checking newsletter subscription");
    match store
        .select_single(&NEWSLETTER_SUBSCRIPTIONS, "email", &Filter::eq("email", email))
        .await
    {
        Ok(_) => Ok(true),
        Err(DbError::NotFound) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Delete every subscription row for `email`, matched exactly as given.
///
/// Unsubscribing an address that was never subscribed succeeds.
pub async fn unsubscribe(store: &dyn Store, email: Option<&str>) -> Result<(), DbError> {
    let email = email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| DbError::Validation("Email is required".into()))?;

    debug!("deleting newsletter subscription");
    store
        .delete(&NEWSLETTER_SUBSCRIPTIONS, &Filter::eq("email", email))
        .await
}
