//! Authentication against the project's auth endpoint

mod session;
mod types;

use async_trait::async_trait;
use log::{info, warn};
use reqwest::Client;
use std::sync::{Arc, RwLock};

use crate::error::{Error, Result};
use crate::fetch::Fetch;
use crate::identity::{Identity, SessionAccessor};

pub use session::*;
pub use types::*;

/// Client for authentication and the current session
pub struct Auth {
    /// The base URL for the project
    url: String,

    /// The anonymous API key for the project
    key: String,

    /// HTTP client used for requests
    client: Client,

    /// The current session
    session: Arc<RwLock<Option<Session>>>,
}

impl Auth {
    /// Create a new Auth client
    pub fn new(url: &str, key: &str, client: Client) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            client,
            session: Arc::new(RwLock::new(None)),
        }
    }

    fn get_auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.url, path)
    }

    fn store_session(&self, session: Option<Session>) {
        let mut guard = self.session.write().unwrap_or_else(|e| e.into_inner());
        *guard = session;
    }

    /// Sign in a user with email and password
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let url = self.get_auth_url("/token?grant_type=password");
        let body = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };

        let session = Fetch::post(&self.client, &url)
            .header("apikey", &self.key)?
            .json(&body)?
            .execute::<Session>()
            .await
            .map_err(|e| {
                warn!("sign-in failed for {}: {}", email, e);
                Error::auth(e)
            })?
            .stamped();

        info!("signed in as {}", session.user.id);
        self.store_session(Some(session.clone()));
        Ok(session)
    }

    /// Sign out the current user
    pub async fn sign_out(&self) -> Result<()> {
        let token = self.access_token().ok_or(Error::NotSignedIn)?;
        let url = self.get_auth_url("/logout");

        Fetch::post(&self.client, &url)
            .header("apikey", &self.key)?
            .bearer_auth(&token)?
            .execute_text()
            .await?;

        self.store_session(None);
        Ok(())
    }

    /// Get the current session
    pub fn get_session(&self) -> Option<Session> {
        let guard = self.session.read().unwrap_or_else(|e| e.into_inner());
        guard.clone()
    }

    /// Set the session, e.g. one restored by the presentation layer
    pub fn set_session(&self, session: Session) {
        self.store_session(Some(session));
    }

    /// Access token of the current, unexpired session
    pub fn access_token(&self) -> Option<String> {
        self.get_session()
            .filter(|s| !s.is_expired())
            .map(|s| s.access_token)
    }
}

#[async_trait]
impl SessionAccessor for Auth {
    async fn current_identity(&self) -> Option<Identity> {
        let session = self.get_session()?;
        if session.is_expired() {
            warn!("session for {} has expired", session.user.id);
            return None;
        }
        Some(Identity::new(session.user.id, session.user.email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session_body(user_id: Uuid) -> serde_json::Value {
        json!({
            "access_token": "token-123",
            "refresh_token": "refresh-123",
            "expires_in": 3600,
            "token_type": "bearer",
            "user": {
                "id": user_id,
                "email": "ana@example.com",
                "app_metadata": {},
                "user_metadata": {}
            }
        })
    }

    #[tokio::test]
    async fn sign_in_stores_session_and_exposes_identity() {
        let mock_server = MockServer::start().await;
        let user_id = Uuid::new_v4();

        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(header("apikey", "anon"))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_body(user_id)))
            .expect(1)
            .mount(&mock_server)
            .await;

        let auth = Auth::new(&mock_server.uri(), "anon", Client::new());
        assert!(auth.current_identity().await.is_none());

        let session = auth.sign_in("ana@example.com", "secret").await.unwrap();
        assert_eq!(session.user.id, user_id);
        assert!(session.expires_at.is_some());

        let identity = auth.current_identity().await.unwrap();
        assert_eq!(identity.id, user_id);
        assert_eq!(identity.email.as_deref(), Some("ana@example.com"));
        assert_eq!(auth.access_token().as_deref(), Some("token-123"));
    }

    #[tokio::test]
    async fn sign_in_failure_is_auth_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&mock_server)
            .await;

        let auth = Auth::new(&mock_server.uri(), "anon", Client::new());
        let result = auth.sign_in("ana@example.com", "wrong").await;
        assert!(matches!(result, Err(Error::Auth(_))));
        assert!(auth.get_session().is_none());
    }

    #[tokio::test]
    async fn expired_session_has_no_identity() {
        let auth = Auth::new("http://localhost:54321", "anon", Client::new());
        let user = User {
            id: Uuid::new_v4(),
            email: None,
            role: None,
            app_metadata: json!({}),
            user_metadata: json!({}),
            created_at: None,
        };
        auth.set_session(Session::new("t".into(), "r".into(), user, -10));
        assert!(auth.current_identity().await.is_none());
        assert!(auth.access_token().is_none());
    }

    #[tokio::test]
    async fn sign_out_without_session_fails() {
        let auth = Auth::new("http://localhost:54321", "anon", Client::new());
        assert!(matches!(auth.sign_out().await, Err(Error::NotSignedIn)));
    }
}
