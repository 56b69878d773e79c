// Error handling module
// Defines the error taxonomy surfaced by every client call

use thiserror::Error;

use crate::auth::AuthStatus;

/// Errors returned in place of a successful JSON payload
#[derive(Error, Debug)]
pub enum ApiError {
    /// No valid access token is held (never logged in, renewing, or renewal failed)
    #[error("Client is not ready.")]
    NotReady { status: AuthStatus },

    /// Backend rejected the access token (HTTP 401)
    #[error("Invalid access token.")]
    Unauthorized,

    /// Backend reported an application-level error via a `msg` field
    #[error("{message}")]
    Application { status: u16, message: String },

    /// Response body was not valid JSON
    #[error("Invalid response body (status {status})")]
    MalformedResponse { status: u16, body: String },

    /// Caller passed an invalid argument; detected before any network call
    #[error("{0}")]
    Validation(String),

    /// Transport-level failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Request did not complete within the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// Operation was cancelled by the caller
    #[error("Operation cancelled")]
    Cancelled,

    /// Ticket acquisition or token exchange failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Numeric status associated with the error, when there is one
    pub fn code(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::Application { status, .. } => Some(*status),
            ApiError::MalformedResponse { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Classify a reqwest error, separating timeouts from other transport failures
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Network(err)
        }
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ApiError::NotReady {
            status: AuthStatus::Unauthenticated,
        };
        assert_eq!(err.to_string(), "Client is not ready.");

        let err = ApiError::Unauthorized;
        assert_eq!(err.to_string(), "Invalid access token.");

        let err = ApiError::Application {
            status: 200,
            message: "rate limited".to_string(),
        };
        assert_eq!(err.to_string(), "rate limited");
    }

    #[test]
    fn test_validation_error_message() {
        let err = ApiError::Validation("Leaderboard type must be 1v1 or 2v2.".to_string());
        assert_eq!(err.to_string(), "Leaderboard type must be 1v1 or 2v2.");
    }

    #[test]
    fn test_auth_error_message() {
        let err = ApiError::Auth("ticket provider unavailable".to_string());
        assert_eq!(
            err.to_string(),
            "Authentication failed: ticket provider unavailable"
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(ApiError::Unauthorized.code(), Some(401));
        assert_eq!(
            ApiError::Application {
                status: 200,
                message: "nope".to_string()
            }
            .code(),
            Some(200)
        );
        assert_eq!(
            ApiError::MalformedResponse {
                status: 502,
                body: "<html>".to_string()
            }
            .code(),
            Some(502)
        );
        assert_eq!(ApiError::Timeout.code(), None);
        assert_eq!(ApiError::Cancelled.code(), None);
        assert_eq!(
            ApiError::NotReady {
                status: AuthStatus::Acquiring
            }
            .code(),
            None
        );
    }
}
