use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;

use crate::auth::AuthManager;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::models::request::{
    BatchBody, RequestDescriptor, RequestOptions, BATCH_PATH, HEADER_ACCESS_TOKEN, HEADER_API_KEY,
    HEADER_CLIENT_ID, HEADER_USER_AGENT,
};
use crate::models::response::classify_body;

/// Build the shared reqwest client with the configured timeouts
pub fn build_http_client(config: &ClientConfig) -> Result<Client, ApiError> {
    Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .build()
        .map_err(|e| ApiError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Authenticated request dispatcher for the Hydra API
///
/// A 401 response hands the stale token back to the `AuthManager` for renewal
/// and fails the call; the caller decides whether to retry.
#[derive(Clone)]
pub struct HydraHttpClient {
    /// Shared HTTP client with connection pooling
    client: Client,

    /// Authentication manager
    auth_manager: AuthManager,

    config: Arc<ClientConfig>,
}

impl HydraHttpClient {
    pub fn new(client: Client, auth_manager: AuthManager, config: Arc<ClientConfig>) -> Self {
        Self {
            client,
            auth_manager,
            config,
        }
    }

    /// Issue a request to `path` with the given options
    pub async fn request(&self, path: &str, options: RequestOptions) -> Result<Value, ApiError> {
        self.dispatch(RequestDescriptor::from_options(path, options))
            .await
    }

    /// Send an authenticated request and classify its response
    pub async fn dispatch(&self, descriptor: RequestDescriptor) -> Result<Value, ApiError> {
        let token = match self.auth_manager.access_token() {
            Ok(token) => token,
            Err(e) => {
                tracing::debug!(path = %descriptor.path, "Client is not ready, request not sent");
                self.auth_manager.renew_if_failed();
                return Err(e);
            }
        };

        let url = self.config.url_for(&descriptor.path);
        tracing::debug!(
            method = %descriptor.method,
            url = %url,
            "Sending HTTP request"
        );

        let mut builder = self
            .client
            .request(descriptor.method.clone(), &url)
            .header(HEADER_ACCESS_TOKEN, &token)
            .header(HEADER_API_KEY, &self.config.api_key)
            .header(HEADER_CLIENT_ID, &self.config.client_id)
            .header(HEADER_USER_AGENT, &self.config.user_agent);

        if !descriptor.query.is_empty() {
            builder = builder.query(&descriptor.query);
        }
        for (name, value) in &descriptor.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(ref body) = descriptor.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            let error_kind = if e.is_timeout() {
                "timeout"
            } else if e.is_connect() {
                "connection_failed"
            } else if e.is_request() {
                "request_error"
            } else {
                "unknown"
            };
            tracing::warn!(
                error_kind = error_kind,
                error = %e,
                url = %url,
                "HTTP request error"
            );
            ApiError::from_transport(e)
        })?;

        let status = response.status();
        tracing::debug!(status = %status, url = %url, "Received HTTP response");

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(url = %url, "Received 401, access token is no longer valid");
            self.auth_manager.invalidate(&token);
            return Err(ApiError::Unauthorized);
        }

        let text = response.text().await.map_err(ApiError::from_transport)?;
        classify_body(status.as_u16(), &text).map_err(|e| {
            tracing::debug!(status = %status, url = %url, error = %e, "Request failed");
            e
        })
    }

    /// Submit `requests` as one all-or-nothing batch
    ///
    /// `allow_failures` is always sent as `false`.
    pub async fn batch(&self, requests: &[RequestDescriptor]) -> Result<Value, ApiError> {
        let body = serde_json::to_value(BatchBody::new(requests))
            .map_err(|e| ApiError::Validation(format!("Batch request is not serializable: {}", e)))?;

        tracing::debug!(count = requests.len(), "Sending batch request");
        self.dispatch(RequestDescriptor::new(Method::PUT, BATCH_PATH).with_body(body))
            .await
    }

    pub fn auth_manager(&self) -> &AuthManager {
        &self.auth_manager
    }
}
