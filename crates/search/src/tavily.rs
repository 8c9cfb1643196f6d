//! Tavily search client.
//!
//! POSTs `{api_key, query, max_results, include_images}` to `/search` and
//! reads back `results[].content` plus the `images` list. Tavily returns
//! images either as bare URLs or as `{url, description}` objects depending
//! on request flags; both shapes are accepted.

use async_trait::async_trait;
use eduguardian_core::error::SearchError;
use eduguardian_core::search::*;
use serde::Deserialize;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.tavily.com";

pub struct TavilySearch {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl TavilySearch {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            client,
        }
    }

    /// Point the client at a different endpoint (proxies, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn request_body(&self, request: &SearchRequest) -> serde_json::Value {
        serde_json::json!({
            "api_key": self.api_key,
            "query": request.query,
            "max_results": request.max_results,
            "include_images": request.include_images,
        })
    }
}

fn status_error(status: u16, body: String) -> SearchError {
    match status {
        401 | 403 => SearchError::NotConfigured("Tavily rejected the API key".into()),
        _ => SearchError::ApiError {
            status_code: status,
            message: body,
        },
    }
}

impl From<TavilyResponse> for SearchResponse {
    fn from(resp: TavilyResponse) -> Self {
        Self {
            results: resp
                .results
                .into_iter()
                .map(|r| SearchResult {
                    title: r.title,
                    url: r.url,
                    content: r.content,
                })
                .collect(),
            images: resp
                .images
                .into_iter()
                .map(|img| match img {
                    TavilyImage::Url(url) => url,
                    TavilyImage::Described { url } => url,
                })
                .filter(|url| !url.is_empty())
                .collect(),
        }
    }
}

#[async_trait]
impl SearchProvider for TavilySearch {
    fn name(&self) -> &str {
        "tavily"
    }

    async fn search(&self, request: SearchRequest) -> Result<SearchResponse, SearchError> {
        if self.api_key.is_empty() {
            return Err(SearchError::NotConfigured(
                "TAVILY_API_KEY is not set".into(),
            ));
        }

        let url = format!("{}/search", self.base_url);
        debug!(query = %request.query, max_results = request.max_results, "Sending Tavily search");

        let response = self
            .client
            .post(&url)
            .json(&self.request_body(&request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout { timeout_secs: 60 }
                } else {
                    SearchError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            warn!(status, body = %body, "Tavily returned error");
            return Err(status_error(status, body));
        }

        let parsed: TavilyResponse =
            response.json().await.map_err(|e| SearchError::ApiError {
                status_code: 200,
                message: format!("Failed to parse search response: {e}"),
            })?;

        Ok(parsed.into())
    }
}

// --- Tavily API types (internal) ---

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
    #[serde(default)]
    images: Vec<TavilyImage>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TavilyImage {
    Url(String),
    Described { url: String },
}
