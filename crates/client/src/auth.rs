//! Credential-based authentication against the store's auth API.
//!
//! Every call maps onto one provider endpoint under `{base}/auth/v1`:
//!   POST /signup
//!   POST /token?grant_type=password
//!   POST /logout
//!   GET  /user

use reqwest::{RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::AuthError;

/// An account as reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub user_metadata: Value,
}

/// Tokens issued on sign-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: User,
}

/// Result of sign-up / sign-in.
///
/// Sign-up yields no session while the provider waits for the address to be
/// confirmed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthResponse {
    pub user: Option<User>,
    pub session: Option<Session>,
}

impl From<Session> for AuthResponse {
    fn from(session: Session) -> Self {
        Self {
            user: Some(session.user.clone()),
            session: Some(session),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpBody {
    Session(Session),
    User(User),
}

/// The provider reports errors under several field names depending on the
/// endpoint.
#[derive(Debug, Default, Deserialize)]
struct ProviderErrorBody {
    msg: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

pub struct AuthClient {
    base_url: String,
    anon_key: String,
    http: reqwest::Client,
    session: RwLock<Option<Session>>,
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            anon_key: anon_key.into(),
            http: reqwest::Client::new(),
            session: RwLock::new(None),
        }
    }

    /// The session remembered from the last successful sign-in, if any.
    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.http
            .post(format!("{}/auth/v1/{path}", self.base_url))
            .header("apikey", &self.anon_key)
    }

    async fn send(request: RequestBuilder) -> Result<Response, AuthError> {
        let response = request.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body: ProviderErrorBody = response.json().await.unwrap_or_default();
        let message = body
            .msg
            .or(body.error_description)
            .or(body.message)
            .or(body.error)
            .unwrap_or_else(|| format!("auth provider returned {status}"));
        Err(AuthError::Provider {
            status: status.as_u16(),
            message,
        })
    }

    async fn fetch<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, AuthError> {
        Ok(Self::send(request).await?.json().await?)
    }

    /// Register a new account.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        debug!("signing up");
        let request = self.post("signup").json(&Credentials { email, password });
        match Self::fetch::<SignUpBody>(request).await {
            Ok(SignUpBody::Session(session)) => {
                *self.session.write().await = Some(session.clone());
                Ok(session.into())
            }
            Ok(SignUpBody::User(user)) => Ok(AuthResponse {
                user: Some(user),
                session: None,
            }),
            Err(e) => {
                error!("Error signing up: {}", e);
                Err(e)
            }
        }
    }

    /// Exchange email and password for a session.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        debug!("signing in");
        let request = self
            .post("token")
            .query(&[("grant_type", "password")])
            .json(&Credentials { email, password });
        match Self::fetch::<Session>(request).await {
            Ok(session) => {
                *self.session.write().await = Some(session.clone());
                Ok(session.into())
            }
            Err(e) => {
                error!("Error signing in: {}", e);
                Err(e)
            }
        }
    }

    /// Revoke the current session.  Without a session this is a no-op.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let Some(session) = self.session.write().await.take() else {
            return Ok(());
        };

        debug!("signing out");
        let request = self.post("logout").bearer_auth(&session.access_token);
        Self::send(request).await.map(drop).map_err(|e| {
            error!("Error signing out: {}", e);
            e
        })
    }

    /// The signed-in user, or `None` on any failure.
    pub async fn get_current_user(&self) -> Option<User> {
        let token = self.session.read().await.as_ref()?.access_token.clone();

        let request = self
            .http
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(token);
        match Self::fetch::<User>(request).await {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("Error getting current user: {}", e);
                None
            }
        }
    }
}
