//! Web search backends for EduGuardian.
//!
//! All backends implement `eduguardian_core::SearchProvider`.
//! - `tavily`: the Tavily search API, returning result bodies and images
//! - `offline`: deterministic canned results for demos and tests without network

pub mod offline;
pub mod tavily;

use std::sync::Arc;
use eduguardian_core::SearchProvider;

pub use offline::OfflineSearch;
pub use tavily::TavilySearch;

/// Build the search backend named in configuration.
///
/// Unknown backend names fall back to Tavily, which reports
/// `NotConfigured` at call time when no key is present.
pub fn build_from_config(config: &eduguardian_config::AppConfig) -> Arc<dyn SearchProvider> {
    match config.search.provider.as_str() {
        "offline" | "mock" => Arc::new(OfflineSearch),
        other => {
            if other != "tavily" {
                tracing::warn!(provider = other, "Unknown search provider, using tavily");
            }
            let mut tavily = TavilySearch::new(config.search.api_key.clone().unwrap_or_default());
            if let Some(url) = &config.search.api_url {
                tavily = tavily.with_base_url(url);
            }
            Arc::new(tavily)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eduguardian_config::AppConfig;

    #[test]
    fn default_config_builds_tavily() {
        let search = build_from_config(&AppConfig::default());
        assert_eq!(search.name(), "tavily");
    }

    #[test]
    fn offline_backend_selectable() {
        let mut config = AppConfig::default();
        config.search.provider = "offline".into();
        assert_eq!(build_from_config(&config).name(), "offline");
    }
}
