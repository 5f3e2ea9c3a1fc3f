//! `api` crate: HTTP REST API layer.
//!
//! Exposes:
//!   POST   /api/contact
//!   GET    /api/contact
//!   POST   /api/course-applications
//!   GET    /api/course-applications
//!   POST   /api/demo-applications
//!   GET    /api/demo-applications
//!   POST   /api/newsletter/subscribe
//!   GET    /api/newsletter/subscriptions
//!   DELETE /api/newsletter/unsubscribe
//!   POST   /api/event-registrations

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use db::{
    models::{ContactMessage, CourseApplication, DemoApplication, EventRegistration, NewsletterSubscription},
    Store,
};
use handlers::{forms, newsletter};

pub use error::{ApiError, Envelope};

/// Shared handler state.  The store must carry the service-role key.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/contact",
            post(forms::create::<ContactMessage>).get(forms::list::<ContactMessage>),
        )
        .route(
            "/api/course-applications",
            post(forms::create::<CourseApplication>).get(forms::list::<CourseApplication>),
        )
        .route(
            "/api/demo-applications",
            post(forms::create::<DemoApplication>).get(forms::list::<DemoApplication>),
        )
        .route("/api/newsletter/subscribe", post(newsletter::subscribe))
        .route(
            "/api/newsletter/subscriptions",
            get(forms::list::<NewsletterSubscription>),
        )
        .route("/api/newsletter/unsubscribe", delete(newsletter::unsubscribe))
        .route(
            "/api/event-registrations",
            post(forms::create::<EventRegistration>),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `addr` and serve the API until the process exits.
pub async fn serve(addr: &str, store: Arc<dyn Store>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API listening on {}", listener.local_addr()?);
    axum::serve(listener, router(AppState::new(store))).await
}
