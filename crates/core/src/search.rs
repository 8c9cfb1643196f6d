//! Search trait: the abstraction over the web search collaborator.
//!
//! The Web Search step asks for a handful of result bodies plus optional
//! image references. Implementations: Tavily, an offline stub.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::SearchError;

/// A search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// The search query
    pub query: String,

    /// Maximum number of results
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Whether image references should be returned
    #[serde(default)]
    pub include_images: bool,
}

fn default_max_results() -> usize {
    2
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_results: default_max_results(),
            include_images: true,
        }
    }
}

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub url: String,

    /// The extracted body text
    pub content: String,
}

/// The result set of a search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,

    /// Image URLs, best match first
    #[serde(default)]
    pub images: Vec<String>,
}

impl SearchResponse {
    /// Result bodies joined by newlines.
    pub fn joined_content(&self) -> String {
        self.results
            .iter()
            .map(|r| r.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// First image reference, or an empty string.
    pub fn first_image(&self) -> String {
        self.images.first().cloned().unwrap_or_default()
    }
}

/// The core SearchProvider trait.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// The provider name (e.g., "tavily", "offline").
    fn name(&self) -> &str;

    /// Run a search.
    async fn search(&self, request: SearchRequest) -> std::result::Result<SearchResponse, SearchError>;
}
