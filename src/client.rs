// Hydra API client
// Per-resource methods over the dispatcher, with local argument validation

use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::auth::{AuthManager, AuthStatus, Credentials, TicketProvider};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http_client::{build_http_client, HydraHttpClient};
use crate::models::request::{RequestDescriptor, RequestOptions};
use crate::models::search::{Platform, SearchPage};
use crate::search::SearchPaginator;

/// Leaderboard game mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardKind {
    OneVsOne,
    TwoVsTwo,
}

impl LeaderboardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaderboardKind::OneVsOne => "1v1",
            LeaderboardKind::TwoVsTwo => "2v2",
        }
    }
}

impl fmt::Display for LeaderboardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeaderboardKind {
    type Err = ApiError;

    /// Only the exact literals `1v1` and `2v2` are accepted
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1v1" => Ok(LeaderboardKind::OneVsOne),
            "2v2" => Ok(LeaderboardKind::TwoVsTwo),
            _ => Err(ApiError::Validation(
                "Leaderboard type must be 1v1 or 2v2.".to_string(),
            )),
        }
    }
}

/// Client for the Hydra game-platform API
#[derive(Clone)]
pub struct HydraClient {
    http_client: HydraHttpClient,
    search: SearchPaginator,
}

impl HydraClient {
    /// Create a client; call [`HydraClient::login`] before issuing requests
    pub fn new(
        config: ClientConfig,
        credentials: Credentials,
        provider: Arc<dyn TicketProvider>,
    ) -> Result<Self, ApiError> {
        config
            .validate()
            .map_err(|e| ApiError::Config(format!("{:#}", e)))?;
        let config = Arc::new(config);
        let client = build_http_client(&config)?;
        let auth_manager = AuthManager::new(config.clone(), client.clone(), credentials, provider);
        Ok(Self::from_parts(
            HydraHttpClient::new(client, auth_manager, config.clone()),
            config.search_page_size,
        ))
    }

    /// Assemble a client around an existing dispatcher
    pub fn from_parts(http_client: HydraHttpClient, search_page_size: u32) -> Self {
        let search = SearchPaginator::new(http_client.clone(), search_page_size);
        Self {
            http_client,
            search,
        }
    }

    /// Acquire the first access token
    pub async fn login(&self) -> Result<(), ApiError> {
        self.auth_manager().acquire().await
    }

    pub fn status(&self) -> AuthStatus {
        self.auth_manager().status()
    }

    pub fn is_ready(&self) -> bool {
        self.auth_manager().is_ready()
    }

    pub fn auth_manager(&self) -> &AuthManager {
        self.http_client.auth_manager()
    }

    pub fn http_client(&self) -> &HydraHttpClient {
        &self.http_client
    }

    /// Raw authenticated request
    pub async fn request(&self, path: &str, options: RequestOptions) -> Result<Value, ApiError> {
        self.http_client.request(path, options).await
    }

    /// All-or-nothing batch of requests
    pub async fn batch(&self, requests: &[RequestDescriptor]) -> Result<Value, ApiError> {
        self.http_client.batch(requests).await
    }

    pub async fn get_profile(&self, id: &str) -> Result<Value, ApiError> {
        let id = require(id, "A user ID must be provided.")?;
        self.get(resource_path(&["profiles", id])?).await
    }

    pub async fn get_match(&self, id: &str) -> Result<Value, ApiError> {
        let id = require(id, "A match ID must be provided.")?;
        self.get(resource_path(&["matches", id])?).await
    }

    /// Matches played by an account, one page at a time (pages start at 1)
    pub async fn get_matches(&self, id: &str, page: u32) -> Result<Value, ApiError> {
        let id = require(id, "A user ID must be provided.")?;
        self.http_client
            .dispatch(
                RequestDescriptor::get(resource_path(&["matches", "all", id])?)
                    .with_query("page", page),
            )
            .await
    }

    pub async fn get_leaderboard(&self, kind: &str) -> Result<Value, ApiError> {
        let kind: LeaderboardKind = kind.parse()?;
        self.get(resource_path(&["leaderboards", kind.as_str(), "show"])?)
            .await
    }

    pub async fn get_profile_leaderboard(&self, id: &str, kind: &str) -> Result<Value, ApiError> {
        let kind: LeaderboardKind = kind.parse()?;
        let id = require(id, "A user ID must be provided.")?;
        self.get(resource_path(&["leaderboards", kind.as_str(), "score-and-rank", id])?)
            .await
    }

    pub async fn get_profile_leaderboard_for_character(
        &self,
        id: &str,
        kind: &str,
        character: &str,
    ) -> Result<Value, ApiError> {
        let kind: LeaderboardKind = kind.parse()?;
        let id = require(id, "A user ID must be provided.")?;
        let character = require(character, "A character must be provided.")?;
        let board = format!("{}_{}", character, kind);
        self.get(resource_path(&["leaderboards", &board, "score-and-rank", id])?)
            .await
    }

    /// One page of accounts whose username contains `query`
    pub async fn search_by_username(
        &self,
        query: &str,
        limit: u32,
        cursor: Option<&str>,
        platform: Option<Platform>,
    ) -> Result<SearchPage, ApiError> {
        self.search
            .search_by_prefix(query, limit, cursor, platform)
            .await
    }

    /// First account whose username equals `query`, or `None` when no page has one
    pub async fn search_exact_username(
        &self,
        query: &str,
        limit: u32,
        cursor: Option<&str>,
        platform: Option<Platform>,
    ) -> Result<Option<Value>, ApiError> {
        self.search.search_exact(query, limit, cursor, platform).await
    }

    /// Cancellable variant of [`HydraClient::search_exact_username`]
    pub async fn search_exact_username_with_cancel(
        &self,
        query: &str,
        limit: u32,
        platform: Option<Platform>,
        cancel: CancellationToken,
    ) -> Result<Option<Value>, ApiError> {
        self.search
            .search_exact_with_cancel(query, limit, None, platform, cancel)
            .await
    }

    async fn get(&self, path: String) -> Result<Value, ApiError> {
        self.http_client.dispatch(RequestDescriptor::get(path)).await
    }
}

/// Join `segments` into an absolute path, percent-encoding each one
fn resource_path(segments: &[&str]) -> Result<String, ApiError> {
    let mut url = Url::parse("http://hydra.invalid/")
        .map_err(|e| ApiError::Config(format!("Failed to build request path: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| ApiError::Config("Failed to build request path".to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url.path().to_string())
}

/// Reject blank identifiers before any network call
fn require<'a>(value: &'a str, message: &str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation(message.to_string()));
    }
    Ok(trimmed)
}
