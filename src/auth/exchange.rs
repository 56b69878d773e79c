// Ticket-for-token exchange

use chrono::Utc;
use reqwest::Client;

use super::types::{TokenData, TokenExchangeRequest, TokenExchangeResponse};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::models::request::{HEADER_API_KEY, HEADER_CLIENT_ID, HEADER_USER_AGENT};
use crate::models::response::classify_body;

/// Token endpoint path
pub const TOKEN_PATH: &str = "/access";

/// Exchange a platform ticket for a backend access token
///
/// Carries only the API key, client id and user agent headers; no access token.
pub async fn exchange_ticket(
    client: &Client,
    config: &ClientConfig,
    ticket: &[u8],
) -> Result<TokenData, ApiError> {
    let url = config.url_for(TOKEN_PATH);
    let body = TokenExchangeRequest::new(&config.auth_provider, hex::encode(ticket));

    tracing::debug!(url = %url, provider = %config.auth_provider, "Exchanging ticket for access token");

    let response = client
        .post(&url)
        .header(HEADER_API_KEY, &config.api_key)
        .header(HEADER_CLIENT_ID, &config.client_id)
        .header(HEADER_USER_AGENT, &config.user_agent)
        .json(&body)
        .send()
        .await
        .map_err(ApiError::from_transport)?;

    let status = response.status();
    let text = response.text().await.map_err(ApiError::from_transport)?;

    // `msg` takes precedence over the status so the backend's reason is kept
    let value = classify_body(status.as_u16(), &text)?;

    if !status.is_success() {
        return Err(ApiError::Auth(format!(
            "token exchange failed with status {}",
            status
        )));
    }

    let data: TokenExchangeResponse = serde_json::from_value(value).map_err(|e| {
        ApiError::Auth(format!("token exchange response has unexpected shape: {}", e))
    })?;

    match data.token {
        Some(token) if !token.is_empty() => Ok(TokenData {
            access_token: token,
            acquired_at: Utc::now(),
        }),
        _ => Err(ApiError::Auth(
            "token exchange response does not contain a token".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn test_config(base_url: String) -> ClientConfig {
        ClientConfig::new("api-key", "client-id").with_base_url(base_url)
    }

    #[tokio::test]
    async fn test_exchange_sends_hex_ticket_and_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/access")
            .match_header("x-hydra-api-key", "api-key")
            .match_header("x-hydra-client-id", "client-id")
            .match_header("x-hydra-user-agent", "Hydra-Cpp/1.132.0")
            .match_header("content-type", "application/json")
            .match_header("x-hydra-access-token", Matcher::Missing)
            .match_body(Matcher::Json(
                json!({"auth": {"steam": "01ab", "fail_on_missing": true}}),
            ))
            .with_status(200)
            .with_body(r#"{"token": "fresh-token"}"#)
            .expect(1)
            .create_async()
            .await;

        let data = exchange_ticket(&Client::new(), &test_config(server.url()), &[0x01, 0xab])
            .await
            .unwrap();

        assert_eq!(data.access_token, "fresh-token");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_exchange_reports_backend_msg() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/access")
            .with_status(400)
            .with_body(r#"{"msg": "Ticket is invalid"}"#)
            .create_async()
            .await;

        let err = exchange_ticket(&Client::new(), &test_config(server.url()), &[1])
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Application { ref message, .. } if message == "Ticket is invalid"));
    }

    #[tokio::test]
    async fn test_exchange_rejects_missing_token() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/access")
            .with_status(200)
            .with_body(r#"{"account_id": "abc"}"#)
            .create_async()
            .await;

        let err = exchange_ticket(&Client::new(), &test_config(server.url()), &[1])
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Auth(_)));
    }

    #[tokio::test]
    async fn test_exchange_rejects_error_status_without_msg() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/access")
            .with_status(503)
            .with_body("{}")
            .create_async()
            .await;

        let err = exchange_ticket(&Client::new(), &test_config(server.url()), &[1])
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Auth(ref m) if m.contains("503")));
    }

    #[tokio::test]
    async fn test_exchange_rejects_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/access")
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let err = exchange_ticket(&Client::new(), &test_config(server.url()), &[1])
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::MalformedResponse { status: 200, .. }));
    }
}
