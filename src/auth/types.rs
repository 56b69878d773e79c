// Authentication types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Account credentials handed to the ticket provider
#[derive(Clone, Default, PartialEq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Token-free view of the authentication state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// No acquisition has been attempted yet
    Unauthenticated,
    /// A ticket exchange is in flight
    Acquiring,
    /// A valid access token is held
    Ready,
    /// The last acquisition failed
    Failed,
}

impl fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthStatus::Unauthenticated => write!(f, "unauthenticated"),
            AuthStatus::Acquiring => write!(f, "acquiring"),
            AuthStatus::Ready => write!(f, "ready"),
            AuthStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Access token together with the time it was issued
#[derive(Debug, Clone, PartialEq)]
pub struct TokenData {
    pub access_token: String,
    pub acquired_at: DateTime<Utc>,
}

/// Authentication state machine
///
/// `Unauthenticated -> Acquiring -> Ready -> (401) -> Acquiring -> ...`,
/// with `Acquiring -> Failed` when the exchange does not yield a token.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AuthState {
    Unauthenticated,
    Acquiring,
    Ready(TokenData),
    Failed(String),
}

impl AuthState {
    pub(crate) fn status(&self) -> AuthStatus {
        match self {
            AuthState::Unauthenticated => AuthStatus::Unauthenticated,
            AuthState::Acquiring => AuthStatus::Acquiring,
            AuthState::Ready(_) => AuthStatus::Ready,
            AuthState::Failed(_) => AuthStatus::Failed,
        }
    }
}

/// Token exchange request body
///
/// Serializes as `{"auth": {"<provider>": "<ticket-hex>", "fail_on_missing": true}}`.
#[derive(Serialize)]
pub struct TokenExchangeRequest {
    pub auth: serde_json::Map<String, serde_json::Value>,
}

impl TokenExchangeRequest {
    pub fn new(provider: &str, ticket_hex: String) -> Self {
        let mut auth = serde_json::Map::new();
        auth.insert(provider.to_string(), serde_json::Value::String(ticket_hex));
        auth.insert("fail_on_missing".to_string(), serde_json::Value::Bool(true));
        Self { auth }
    }
}

/// Token exchange response
#[derive(Deserialize)]
pub struct TokenExchangeResponse {
    pub token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("player", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("player"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_exchange_request_shape() {
        let body = TokenExchangeRequest::new("steam", "0a1b2c".to_string());
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"auth": {"steam": "0a1b2c", "fail_on_missing": true}})
        );
    }

    #[test]
    fn test_state_status() {
        assert_eq!(AuthState::Unauthenticated.status(), AuthStatus::Unauthenticated);
        assert_eq!(AuthState::Acquiring.status(), AuthStatus::Acquiring);
        assert_eq!(AuthState::Failed("x".into()).status(), AuthStatus::Failed);
        let ready = AuthState::Ready(TokenData {
            access_token: "t".into(),
            acquired_at: Utc::now(),
        });
        assert_eq!(ready.status(), AuthStatus::Ready);
    }
}
