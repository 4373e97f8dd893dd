//! Login
//!
//! Sign-out lives on [`PlatformClient::logout`](crate::PlatformClient::logout),
//! which must coordinate with an in-flight assistant exchange.

use crate::session::SessionStore;
use crate::transport::{NormalizedError, RequestContext, Transport};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const LOGIN_PATH: &str = "/api/v1/auth/login";

/// What the auth endpoint says about the signed-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthProfile {
    pub role: String,
    #[serde(default, alias = "token", skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Any other fields, kept as sent
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Authentication against the platform API
pub struct Authenticator<T> {
    transport: T,
    session: SessionStore,
}

impl<T: Transport> Authenticator<T> {
    #[must_use]
    pub fn new(transport: T, session: SessionStore) -> Self {
        Self { transport, session }
    }

    /// Sign in. A token in the reply replaces the session's token.
    ///
    /// # Errors
    /// Validation error for blank credentials (nothing sent); `HttpStatus`
    /// for rejected credentials; `Decode` if the reply has no `role`.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthProfile, NormalizedError> {
        let username = username.trim();
        if username.is_empty() || password.trim().is_empty() {
            return Err(NormalizedError::validation(
                "Username and password are required",
            ));
        }

        let request = RequestContext::get(LOGIN_PATH)
            .with_query("u", username)
            .with_query("p", password);

        let value = self
            .transport
            .execute(request)
            .await?
            .into_json()
            .ok_or_else(|| NormalizedError::decode("Login reply was not JSON"))?;

        let profile: AuthProfile = serde_json::from_value(value)
            .map_err(|e| NormalizedError::decode(format!("Failed to parse login reply: {e}")))?;

        if let Some(token) = profile.access_token.as_deref().filter(|t| !t.is_empty()) {
            self.session.set_token(token);
        }

        tracing::info!(
            session_id = %self.session.id(),
            role = %profile.role,
            token = profile.access_token.is_some(),
            "Signed in"
        );
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;
    use crate::transport::ErrorKind;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_login_sends_query_and_stores_token() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_json(json!({ "role": "teacher", "access_token": "jwt-1", "name": "Amal" }));
        let session = SessionStore::new();
        let auth = Authenticator::new(transport.clone(), session.clone());

        let profile = auth.login(" amal ", "s3cret").await.unwrap();
        assert_eq!(profile.role, "teacher");
        assert_eq!(profile.extra.get("name"), Some(&json!("Amal")));
        assert_eq!(session.get_token().as_deref(), Some("jwt-1"));

        let request = &transport.recorded_requests()[0];
        assert_eq!(request.path, LOGIN_PATH);
        assert!(!request.requires_auth);
        assert_eq!(
            request.query,
            vec![
                ("u".to_string(), "amal".to_string()),
                ("p".to_string(), "s3cret".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_login_without_token_keeps_existing() {
        let transport = MockTransport::new();
        transport.queue_json(json!({ "role": "admin" }));
        let session = SessionStore::new();
        session.set_token("old");
        let auth = Authenticator::new(transport, session.clone());

        let profile = auth.login("admin", "pw").await.unwrap();
        assert_eq!(profile.access_token, None);
        assert_eq!(session.get_token().as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn test_token_alias() {
        let transport = MockTransport::new();
        transport.queue_json(json!({ "role": "student", "token": "t-2" }));
        let session = SessionStore::new();
        Authenticator::new(transport, session.clone())
            .login("s", "p")
            .await
            .unwrap();
        assert_eq!(session.get_token().as_deref(), Some("t-2"));
    }

    #[tokio::test]
    async fn test_blank_credentials_not_sent() {
        let transport = Arc::new(MockTransport::new());
        let auth = Authenticator::new(transport.clone(), SessionStore::new());
        assert!(auth.login("", "pw").await.unwrap_err().is_validation());
        assert!(auth.login("user", "  ").await.unwrap_err().is_validation());
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_rejected_credentials() {
        let transport = MockTransport::new();
        transport.queue_error(NormalizedError::http_status(401, "Incorrect email or password"));
        let auth = Authenticator::new(transport, SessionStore::new());
        let err = auth.login("x", "y").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::HttpStatus);
        assert_eq!(err.message, "Incorrect email or password");
    }

    #[tokio::test]
    async fn test_missing_role_is_decode_error() {
        let transport = MockTransport::new();
        transport.queue_json(json!({ "access_token": "t" }));
        let session = SessionStore::new();
        let auth = Authenticator::new(transport, session.clone());
        let err = auth.login("x", "y").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Decode);
        assert_eq!(session.get_token(), None);
    }
}
