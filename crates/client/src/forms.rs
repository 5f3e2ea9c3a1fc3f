//! Typed form submissions made with the anonymous key.

use std::sync::Arc;

use tracing::error;

use db::{
    models::{
        ContactMessage, CourseApplication, DemoApplication, EventRegistration,
        NewContactMessage, NewCourseApplication, NewDemoApplication, NewEventRegistration,
        NewNewsletterSubscription, NewsletterSubscription,
    },
    repository, Entity, RestStore, Store,
};

use crate::{AuthClient, ClientError};

/// Optional form fields left blank are stored as `null`.
fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

pub struct SiteClient {
    store: Arc<dyn Store>,
    auth: AuthClient,
}

impl SiteClient {
    /// Client for the hosted store at `base_url`, authenticated with the
    /// anonymous key.
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            store: Arc::new(RestStore::new(base_url, anon_key)),
            auth: AuthClient::new(base_url, anon_key),
        }
    }

    /// Client over an arbitrary store, e.g. [`db::MemoryStore`].
    pub fn with_store(store: Arc<dyn Store>, auth: AuthClient) -> Self {
        Self { store, auth }
    }

    /// Sign-up / sign-in / sign-out / current-user.
    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    async fn create<E: Entity>(&self, input: &E::Insert) -> Result<E, ClientError> {
        repository::create::<E>(self.store.as_ref(), input)
            .await
            .map_err(|e| {
                error!("Error creating {} row: {}", E::TABLE.name, e);
                e.into()
            })
    }

    pub async fn create_contact_message(
        &self,
        mut input: NewContactMessage,
    ) -> Result<ContactMessage, ClientError> {
        input.course_interest = blank_to_none(input.course_interest);
        self.create::<ContactMessage>(&input).await
    }

    pub async fn create_course_application(
        &self,
        input: NewCourseApplication,
    ) -> Result<CourseApplication, ClientError> {
        self.create::<CourseApplication>(&input).await
    }

    pub async fn create_demo_application(
        &self,
        mut input: NewDemoApplication,
    ) -> Result<DemoApplication, ClientError> {
        input.preferred_date = blank_to_none(input.preferred_date);
        self.create::<DemoApplication>(&input).await
    }

    pub async fn create_newsletter_subscription(
        &self,
        input: NewNewsletterSubscription,
    ) -> Result<NewsletterSubscription, ClientError> {
        self.create::<NewsletterSubscription>(&input).await
    }

    pub async fn create_event_registration(
        &self,
        mut input: NewEventRegistration,
    ) -> Result<EventRegistration, ClientError> {
        input.alternate_number = blank_to_none(input.alternate_number);
        self.create::<EventRegistration>(&input).await
    }

    /// `true` if `email` is already on the newsletter list.
    pub async fn check_newsletter_subscription(&self, email: &str) -> Result<bool, ClientError> {
        repository::subscription_exists(self.store.as_ref(), email)
            .await
            .map_err(|e| {
                error!("Error checking newsletter subscription: {}", e);
                e.into()
            })
    }
}

#[cfg(test)]
mod tests {
    use db::{models::Table, DbError, Filter, MemoryStore, Order};
    use serde_json::Value;

    use super::*;

    fn client() -> SiteClient {
        SiteClient::with_store(
            Arc::new(MemoryStore::new()),
            AuthClient::new("http://127.0.0.1:9", "anon"),
        )
    }

    #[tokio::test]
    async fn blank_optional_fields_become_null() {
        let client = client();
        let msg = client
            .create_contact_message(NewContactMessage {
                first_name: "A".into(),
                last_name: "B".into(),
                email: "a@b.com".into(),
                phone: "123".into(),
                course_interest: Some(String::new()),
                message: "hi".into(),
            })
            .await
            .unwrap();
        assert_eq!(msg.course_interest, None);

        let demo = client
            .create_demo_application(NewDemoApplication {
                name: "N".into(),
                phone: "1".into(),
                email: "n@example.com".into(),
                course_for_demo: "Rust".into(),
                available_time: "10:00".into(),
                preferred_date: Some("2024-06-01".into()),
            })
            .await
            .unwrap();
        assert_eq!(demo.preferred_date.as_deref(), Some("2024-06-01"));
    }

    #[tokio::test]
    async fn newsletter_check_follows_inserts() {
        let client = client();
        assert!(!client.check_newsletter_subscription("x@y.com").await.unwrap());

        client
            .create_newsletter_subscription(NewNewsletterSubscription { email: "x@y.com".into() })
            .await
            .unwrap();
        assert!(client.check_newsletter_subscription("x@y.com").await.unwrap());

        let err = client
            .create_newsletter_subscription(NewNewsletterSubscription { email: "x@y.com".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Persistence(ref m) if m.contains("duplicate key")));
    }

    struct Unreachable;

    #[async_trait::async_trait]
    impl Store for Unreachable {
        async fn insert(&self, _: &Table, _: Value) -> Result<Value, DbError> {
            Err(DbError::from_store(None, "connection refused"))
        }
        async fn select_single(&self, _: &Table, _: &str, _: &Filter) -> Result<Value, DbError> {
            Err(DbError::from_store(Some("PGRST301".into()), "JWT expired"))
        }
        async fn select_all(&self, _: &Table, _: &Order) -> Result<Vec<Value>, DbError> {
            Ok(Vec::new())
        }
        async fn update(&self, _: &Table, _: &Filter, _: Value) -> Result<Vec<Value>, DbError> {
            Ok(Vec::new())
        }
        async fn delete(&self, _: &Table, _: &Filter) -> Result<(), DbError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn store_failures_surface_as_persistence_errors() {
        let client = SiteClient::with_store(
            Arc::new(Unreachable),
            AuthClient::new("http://127.0.0.1:9", "anon"),
        );

        let err = client
            .create_event_registration(NewEventRegistration::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Persistence(ref m) if m == "connection refused"));

        // Only "no rows" counts as not subscribed.
        let err = client.check_newsletter_subscription("x@y.com").await.unwrap_err();
        assert_eq!(err.to_string(), "JWT expired");
    }
}
