use serde_json::Value;

use crate::error::ApiError;

/// Decoded backend response
///
/// Any object carrying a `msg` field is a failure, whatever else it contains
/// and whatever the HTTP status was.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseEnvelope {
    Success(Value),
    Failure { message: String },
}

impl From<Value> for ResponseEnvelope {
    fn from(value: Value) -> Self {
        match value.get("msg") {
            Some(Value::String(message)) => ResponseEnvelope::Failure {
                message: message.clone(),
            },
            Some(other) => ResponseEnvelope::Failure {
                message: other.to_string(),
            },
            None => ResponseEnvelope::Success(value),
        }
    }
}

impl ResponseEnvelope {
    pub fn into_result(self, status: u16) -> Result<Value, ApiError> {
        match self {
            ResponseEnvelope::Success(value) => Ok(value),
            ResponseEnvelope::Failure { message } => Err(ApiError::Application { status, message }),
        }
    }
}

/// Classify a raw response body: malformed, application error, or success
pub fn classify_body(status: u16, body: &str) -> Result<Value, ApiError> {
    let value: Value = serde_json::from_str(body).map_err(|_| ApiError::MalformedResponse {
        status,
        body: body.to_string(),
    })?;
    ResponseEnvelope::from(value).into_result(status)
}
