use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

// ==================================================================================================
// Headers
// ==================================================================================================

pub const HEADER_ACCESS_TOKEN: &str = "x-hydra-access-token";
pub const HEADER_API_KEY: &str = "x-hydra-api-key";
pub const HEADER_CLIENT_ID: &str = "x-hydra-client-id";
pub const HEADER_USER_AGENT: &str = "x-hydra-user-agent";

// ==================================================================================================
// Request Models
// ==================================================================================================

/// Per-call options for `HydraHttpClient::request`
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Defaults to GET
    pub method: Option<Method>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// A single backend request, built per call and never mutated after dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub headers: BTreeMap<String, String>,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: BTreeMap::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn from_options(path: impl Into<String>, options: RequestOptions) -> Self {
        Self {
            method: options.method.unwrap_or(Method::GET),
            path: path.into(),
            query: options.query,
            body: options.body,
            headers: BTreeMap::new(),
        }
    }

    /// Append a query parameter; repeated keys are kept in order
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Path with the encoded query string appended
    pub fn path_and_query(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish();
        format!("{}?{}", self.path, query)
    }
}

// ==================================================================================================
// Batch Models
// ==================================================================================================

/// Batch endpoint path
pub const BATCH_PATH: &str = "/batch";

#[derive(Debug, Serialize)]
pub struct BatchOptions {
    pub allow_failures: bool,
}

#[derive(Debug, Serialize)]
pub struct BatchEntry {
    pub verb: String,
    pub url: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl From<&RequestDescriptor> for BatchEntry {
    fn from(descriptor: &RequestDescriptor) -> Self {
        Self {
            verb: descriptor.method.as_str().to_string(),
            url: descriptor.path_and_query(),
            headers: descriptor.headers.clone(),
            body: descriptor.body.clone(),
        }
    }
}

/// Batch request body; the whole batch fails if any sub-request fails
#[derive(Debug, Serialize)]
pub struct BatchBody {
    pub options: BatchOptions,
    pub requests: Vec<BatchEntry>,
}

impl BatchBody {
    pub fn new(requests: &[RequestDescriptor]) -> Self {
        Self {
            options: BatchOptions {
                allow_failures: false,
            },
            requests: requests.iter().map(BatchEntry::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_path_and_query_encodes_repeated_keys() {
        let descriptor = RequestDescriptor::get("/profiles/search")
            .with_query("username", "Bob Smith")
            .with_query("account_fields", "identity")
            .with_query("account_fields", "presence");

        assert_eq!(
            descriptor.path_and_query(),
            "/profiles/search?username=Bob+Smith&account_fields=identity&account_fields=presence"
        );
    }

    #[test]
    fn test_path_without_query() {
        assert_eq!(RequestDescriptor::get("/matches/1").path_and_query(), "/matches/1");
    }

    #[test]
    fn test_from_options_defaults_to_get() {
        let descriptor = RequestDescriptor::from_options("/profiles/me", RequestOptions::default());
        assert_eq!(descriptor.method, Method::GET);
        assert!(descriptor.body.is_none());
    }

    #[test]
    fn test_batch_body_shape() {
        let requests = vec![
            RequestDescriptor::get("/profiles/a"),
            RequestDescriptor::get("/matches/all/a").with_query("page", 2),
            RequestDescriptor::new(Method::PUT, "/profiles/a/data")
                .with_body(json!({"x": 1}))
                .with_header("x-extra", "1"),
        ];

        let body = serde_json::to_value(BatchBody::new(&requests)).unwrap();
        assert_eq!(
            body,
            json!({
                "options": {"allow_failures": false},
                "requests": [
                    {"verb": "GET", "url": "/profiles/a"},
                    {"verb": "GET", "url": "/matches/all/a?page=2"},
                    {"verb": "PUT", "url": "/profiles/a/data", "headers": {"x-extra": "1"}, "body": {"x": 1}}
                ]
            })
        );
    }
}
