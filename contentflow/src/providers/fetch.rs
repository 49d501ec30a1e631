//! URL fetching with readable-text extraction.

use super::http::send;
use super::{config_str, ActionProvider};
use crate::context::{render_template, ExecutionContext, PREVIOUS_RESULT_PLACEHOLDER};
use crate::errors::{ContentflowError, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;

const DEFAULT_MAX_LENGTH: usize = 10_000;

const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "main",
    "[role='main']",
    "#content",
    ".content",
    ".post-content",
    ".entry-content",
];

/// Fetches a page and returns `{url, title, description, text}` as JSON.
///
/// The URL comes from the `url` template, defaulting to the previous
/// result, so a search or LLM step can pick the page.
#[derive(Debug, Clone)]
pub struct UrlFetchProvider {
    client: Client,
    timeout: Duration,
}

impl UrlFetchProvider {
    /// Provider id.
    pub const ID: &'static str = "url_fetch";

    /// Creates the provider.
    #[must_use]
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

/// Page fields pulled out of an HTML document.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ExtractedPage {
    pub title: Option<String>,
    pub description: Option<String>,
    pub text: String,
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn extract_page(html: &str, max_length: usize) -> ExtractedPage {
    let document = Html::parse_document(html);

    let title = Selector::parse("title").ok().and_then(|selector| {
        document
            .select(&selector)
            .next()
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .filter(|t| !t.is_empty())
    });

    let description = Selector::parse("meta[name='description']")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .and_then(|el| el.value().attr("content").map(str::to_string))
        });

    let mut parts = Vec::new();
    for selector in CONTENT_SELECTORS.iter().filter_map(|s| Selector::parse(s).ok()) {
        parts.extend(
            document
                .select(&selector)
                .map(|el| el.text().collect::<Vec<_>>().join(" "))
                .filter(|t| !t.trim().is_empty()),
        );
        if !parts.is_empty() {
            break;
        }
    }
    if parts.is_empty() {
        if let Ok(body) = Selector::parse("body") {
            parts.extend(document.select(&body).map(|el| el.text().collect::<Vec<_>>().join(" ")));
        }
    }

    let mut text = collapse_whitespace(&parts.join(" "));
    if text.chars().count() > max_length {
        text = text.chars().take(max_length).collect();
    }

    ExtractedPage {
        title,
        description,
        text,
    }
}

#[async_trait]
impl ActionProvider for UrlFetchProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn execute(&self, config: &serde_json::Value, ctx: &ExecutionContext) -> Result<String> {
        let template = config_str(config, "url").unwrap_or(PREVIOUS_RESULT_PLACEHOLDER);
        let url = render_template(template, ctx).trim().to_string();
        let parsed = reqwest::Url::parse(&url)
            .map_err(|e| ContentflowError::validation(format!("cannot fetch '{url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ContentflowError::validation(format!(
                "cannot fetch '{url}': only http and https are supported"
            )));
        }
        let max_length = config
            .get("max_length")
            .and_then(serde_json::Value::as_u64)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(DEFAULT_MAX_LENGTH);

        let request = self.client.get(parsed).timeout(self.timeout);
        let html = send(Self::ID, &url, request)
            .await?
            .text()
            .await
            .map_err(|e| ContentflowError::provider(Self::ID, format!("unreadable body: {e}")))?;

        let page = extract_page(&html, max_length);
        tracing::debug!(url = %url, chars = page.text.len(), "Fetched page");

        Ok(serde_json::json!({
            "url": url,
            "title": page.title,
            "description": page.description,
            "text": page.text,
        })
        .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"<html>
        <head><title> Tide Tables </title><meta name="description" content="Local tides"></head>
        <body><nav>Menu</nav><article><h1>Today</h1><p>High tide at   noon.</p></article></body>
    </html>"#;

    #[test]
    fn test_extract_prefers_article() {
        let page = extract_page(PAGE, 1000);
        assert_eq!(page.title.as_deref(), Some("Tide Tables"));
        assert_eq!(page.description.as_deref(), Some("Local tides"));
        assert_eq!(page.text, "Today High tide at noon.");
    }

    #[test]
    fn test_extract_truncates() {
        let page = extract_page("<body>abcdefghij</body>", 4);
        assert_eq!(page.text, "abcd");
    }

    #[tokio::test]
    async fn test_fetches_previous_result_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tides"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .expect(1)
            .mount(&server)
            .await;

        let mut ctx = ExecutionContext::for_pipeline("p");
        ctx.record_output("s", None, format!("{}/tides", server.uri()));
        let provider = UrlFetchProvider::new(Client::new(), Duration::from_secs(5));

        let out = provider.execute(&serde_json::json!({}), &ctx).await.unwrap();
        let page: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(page["title"], "Tide Tables");
    }

    #[tokio::test]
    async fn test_rejects_non_url() {
        let mut ctx = ExecutionContext::for_pipeline("p");
        ctx.record_output("s", None, "just some words");
        let provider = UrlFetchProvider::new(Client::new(), Duration::from_secs(5));

        let err = provider.execute(&serde_json::json!({}), &ctx).await.unwrap_err();
        assert_eq!(err.kind(), "ValidationError");
    }
}
