// Username search
// Prefix search and cursor-driven exact-match search over the profile search endpoint

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::ApiError;
use crate::http_client::HydraHttpClient;
use crate::models::request::RequestDescriptor;
use crate::models::search::{matches_exact, matches_prefix, Platform, SearchPage};

/// Profile search endpoint
pub const SEARCH_PATH: &str = "/profiles/search_queries/get-by-username/run";

/// Account sections requested with every search
pub const ACCOUNT_FIELDS: [&str; 4] = ["identity", "presence", "server_data", "data"];

/// Search paginator built on the request dispatcher
#[derive(Clone)]
pub struct SearchPaginator {
    http_client: HydraHttpClient,

    /// Page size for every page after the first in exact-match search
    page_size: u32,
}

impl SearchPaginator {
    pub fn new(http_client: HydraHttpClient, page_size: u32) -> Self {
        Self {
            http_client,
            page_size,
        }
    }

    /// Fetch one page of results
    ///
    /// With a platform, only entries whose username on that platform contains
    /// `query` (case-insensitive) are kept.
    pub async fn search_by_prefix(
        &self,
        query: &str,
        limit: u32,
        cursor: Option<&str>,
        platform: Option<Platform>,
    ) -> Result<SearchPage, ApiError> {
        validate_query(query)?;
        let mut page = self.fetch_page(query, limit, cursor).await?;

        if let Some(platform) = platform {
            page.results
                .retain(|entry| matches_prefix(entry, query, platform));
        }

        Ok(page)
    }

    /// Page through results until a username matches `query` exactly (case-insensitive)
    ///
    /// Returns the first match of the first page that has one, or `None` once
    /// a page without matches carries no cursor.
    pub async fn search_exact(
        &self,
        query: &str,
        limit: u32,
        cursor: Option<&str>,
        platform: Option<Platform>,
    ) -> Result<Option<Value>, ApiError> {
        validate_query(query)?;

        let mut cursor = cursor.map(str::to_string);
        let mut limit = limit;
        let mut pages = 0u32;

        loop {
            let page = self.fetch_page(query, limit, cursor.as_deref()).await?;
            pages += 1;

            if let Some(found) = page
                .results
                .into_iter()
                .find(|entry| matches_exact(entry, query, platform))
            {
                tracing::debug!(query = %query, pages = pages, "Exact match found");
                return Ok(Some(found));
            }

            match page.cursor {
                Some(next) => {
                    cursor = Some(next);
                    limit = self.page_size;
                }
                None => {
                    tracing::debug!(query = %query, pages = pages, "Search exhausted without a match");
                    return Ok(None);
                }
            }
        }
    }

    /// `search_exact` that stops with `ApiError::Cancelled` once `cancel` fires
    pub async fn search_exact_with_cancel(
        &self,
        query: &str,
        limit: u32,
        cursor: Option<&str>,
        platform: Option<Platform>,
        cancel: CancellationToken,
    ) -> Result<Option<Value>, ApiError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(query = %query, "Search cancelled");
                Err(ApiError::Cancelled)
            }
            result = self.search_exact(query, limit, cursor, platform) => result,
        }
    }

    async fn fetch_page(
        &self,
        query: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<SearchPage, ApiError> {
        let mut descriptor = RequestDescriptor::get(SEARCH_PATH)
            .with_query("username", query)
            .with_query("limit", limit);
        if let Some(cursor) = cursor {
            descriptor = descriptor.with_query("cursor", cursor);
        }
        for field in ACCOUNT_FIELDS {
            descriptor = descriptor.with_query("account_fields", field);
        }

        let value = self.http_client.dispatch(descriptor).await?;
        Ok(SearchPage::from_value(value))
    }
}

fn validate_query(query: &str) -> Result<(), ApiError> {
    if query.trim().is_empty() {
        return Err(ApiError::Validation("A query must be provided.".to_string()));
    }
    Ok(())
}
