//! Web and news search providers.
//!
//! Both return a JSON array of `{title, url, snippet, source?}` objects so
//! later steps can consume results from either backend the same way.

use super::http::send_json;
use super::{config_str, require_str, ActionProvider};
use crate::context::ExecutionContext;
use crate::errors::{ContentflowError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

/// Default Google Custom Search endpoint.
pub const DEFAULT_GOOGLE_SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// Default NewsAPI endpoint.
pub const DEFAULT_NEWS_API_URL: &str = "https://newsapi.org/v2/everything";

const DEFAULT_RESULT_COUNT: u64 = 5;

/// One normalized search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    /// Result title.
    pub title: String,
    /// Result URL.
    pub url: String,
    /// Short description.
    pub snippet: String,
    /// Publisher, when the backend reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

fn field(item: &serde_json::Value, key: &str) -> String {
    item.get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

fn result_count(config: &serde_json::Value, key: &str) -> u64 {
    config
        .get(key)
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(DEFAULT_RESULT_COUNT)
        .clamp(1, 10)
}

/// Google Custom Search JSON API.
///
/// Config: `api_key`, `cx`, `query`, optional `num` (1..=10) and `endpoint`.
#[derive(Debug, Clone)]
pub struct GoogleSearchProvider {
    client: Client,
    timeout: Duration,
}

impl GoogleSearchProvider {
    /// Provider id.
    pub const ID: &'static str = "google_search";

    /// Creates the provider.
    #[must_use]
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl ActionProvider for GoogleSearchProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn execute(&self, config: &serde_json::Value, _ctx: &ExecutionContext) -> Result<String> {
        let api_key = require_str(Self::ID, config, "api_key")?;
        let cx = require_str(Self::ID, config, "cx")?;
        let query = require_str(Self::ID, config, "query")?;
        let num = result_count(config, "num").to_string();
        let url = config_str(config, "endpoint").unwrap_or(DEFAULT_GOOGLE_SEARCH_URL);

        let request = self
            .client
            .get(url)
            .timeout(self.timeout)
            .query(&[("key", api_key), ("cx", cx), ("q", query), ("num", num.as_str())]);
        let body = send_json(Self::ID, url, request).await?;

        let hits: Vec<SearchHit> = body
            .get("items")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .map(|item| SearchHit {
                        title: field(item, "title"),
                        url: field(item, "link"),
                        snippet: field(item, "snippet"),
                        source: item
                            .get("displayLink")
                            .and_then(|v| v.as_str())
                            .map(str::to_string),
                    })
                    .collect()
            })
            .unwrap_or_default();

        tracing::debug!(query, hits = hits.len(), "Google search finished");
        Ok(serde_json::to_string(&hits)?)
    }
}

/// NewsAPI `everything` endpoint.
///
/// Config: `api_key`, `query`, optional `page_size` (1..=10), `language`,
/// `sort_by` and `endpoint`.
#[derive(Debug, Clone)]
pub struct NewsApiProvider {
    client: Client,
    timeout: Duration,
}

impl NewsApiProvider {
    /// Provider id.
    pub const ID: &'static str = "news_api";

    /// Creates the provider.
    #[must_use]
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl ActionProvider for NewsApiProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn execute(&self, config: &serde_json::Value, _ctx: &ExecutionContext) -> Result<String> {
        let api_key = require_str(Self::ID, config, "api_key")?;
        let query = require_str(Self::ID, config, "query")?;
        let page_size = result_count(config, "page_size").to_string();
        let url = config_str(config, "endpoint").unwrap_or(DEFAULT_NEWS_API_URL);

        let mut params = vec![("q", query), ("pageSize", page_size.as_str())];
        if let Some(language) = config_str(config, "language") {
            params.push(("language", language));
        }
        params.push(("sortBy", config_str(config, "sort_by").unwrap_or("publishedAt")));

        let request = self
            .client
            .get(url)
            .header("X-Api-Key", api_key)
            .timeout(self.timeout)
            .query(&params);
        let body = send_json(Self::ID, url, request).await?;

        if body.get("status").and_then(|v| v.as_str()) != Some("ok") {
            let message = body
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("unexpected response status");
            return Err(ContentflowError::provider(Self::ID, message));
        }

        let hits: Vec<SearchHit> = body
            .get("articles")
            .and_then(|v| v.as_array())
            .map(|articles| {
                articles
                    .iter()
                    .map(|a| SearchHit {
                        title: field(a, "title"),
                        url: field(a, "url"),
                        snippet: field(a, "description"),
                        source: a
                            .pointer("/source/name")
                            .and_then(|v| v.as_str())
                            .map(str::to_string),
                    })
                    .collect()
            })
            .unwrap_or_default();

        tracing::debug!(query, hits = hits.len(), "News search finished");
        Ok(serde_json::to_string(&hits)?)
    }
}
