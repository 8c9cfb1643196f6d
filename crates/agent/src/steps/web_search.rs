//! Web Search step: fetches context and a diagram when nothing local matched.

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use eduguardian_core::error::SearchError;
use eduguardian_core::{
    LessonState, LessonUpdate, Result, SearchProvider, SearchRequest, SourceType, StepName,
};
use tracing::{debug, warn};
use super::Step;

pub struct WebSearchStep {
    search: Arc<dyn SearchProvider>,
    max_results: usize,
    include_images: bool,
    timeout: Duration,
    degrade_on_failure: bool,
}

impl WebSearchStep {
    pub fn new(search: Arc<dyn SearchProvider>) -> Self {
        Self {
            search,
            max_results: 2,
            include_images: true,
            timeout: Duration::from_secs(60),
            degrade_on_failure: true,
        }
    }

    pub fn with_limits(mut self, max_results: usize, include_images: bool) -> Self {
        self.max_results = max_results;
        self.include_images = include_images;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// When false, a search failure aborts the run.
    pub fn with_degrade_on_failure(mut self, degrade: bool) -> Self {
        self.degrade_on_failure = degrade;
        self
    }
}

#[async_trait]
impl Step for WebSearchStep {
    fn name(&self) -> StepName {
        StepName::WebSearch
    }

    async fn run(&self, state: &LessonState) -> Result<LessonUpdate> {
        let update = LessonUpdate::new().log("🌐 **Web Search:** Fetching live diagrams and text...");

        let request = SearchRequest {
            query: state.query.clone(),
            max_results: self.max_results,
            include_images: self.include_images,
        };

        debug!(provider = %self.search.name(), query = %request.query, "Searching the web");

        let outcome = match tokio::time::timeout(self.timeout, self.search.search(request)).await {
            Ok(result) => result,
            Err(_) => Err(SearchError::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }),
        };

        match outcome {
            Ok(response) => {
                debug!(results = response.results.len(), images = response.images.len(), "Search complete");
                Ok(update
                    .context(response.joined_content())
                    .image_url(response.first_image())
                    .source_type(SourceType::WebSearch))
            }
            Err(e) if self.degrade_on_failure => {
                warn!(error = %e, "Web search failed, continuing without context");
                Ok(update
                    .log(format!("🌐 **Web Search:** Search unavailable ({e}), continuing without context."))
                    .context("")
                    .image_url("")
                    .source_type(SourceType::None))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::ScriptedSearch;
    use eduguardian_core::{Error, LessonRequest, StudentLevel};

    fn state() -> LessonState {
        LessonState::from_request(&LessonRequest::new("Explain gravity", StudentLevel::Secondary))
    }

    #[tokio::test]
    async fn joins_results_and_takes_first_image() {
        let search = Arc::new(ScriptedSearch::with_results(
            &["Gravity pulls mass together.", "Newton described it."],
            &["https://img.example/g1.png", "https://img.example/g2.png"],
        ));
        let step = WebSearchStep::new(search.clone());
        let update = step.run(&state()).await.unwrap();

        assert_eq!(
            update.context.as_deref(),
            Some("Gravity pulls mass together.\nNewton described it.")
        );
        assert_eq!(update.image_url.as_deref(), Some("https://img.example/g1.png"));
        assert_eq!(update.source_type, Some(SourceType::WebSearch));

        let requests = search.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].max_results, 2);
        assert!(requests[0].include_images);
    }

    #[tokio::test]
    async fn no_images_gives_empty_url() {
        let search = Arc::new(ScriptedSearch::with_results(&["Only text."], &[]));
        let update = WebSearchStep::new(search).run(&state()).await.unwrap();
        assert_eq!(update.image_url.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn failure_degrades_by_default() {
        let search = Arc::new(ScriptedSearch::failing());
        let update = WebSearchStep::new(search).run(&state()).await.unwrap();
        assert_eq!(update.context.as_deref(), Some(""));
        assert_eq!(update.image_url.as_deref(), Some(""));
        assert_eq!(update.source_type, Some(SourceType::None));
        assert_eq!(update.log.len(), 2);
    }

    #[tokio::test]
    async fn failure_propagates_when_strict() {
        let search = Arc::new(ScriptedSearch::failing());
        let step = WebSearchStep::new(search).with_degrade_on_failure(false);
        let err = step.run(&state()).await.unwrap_err();
        assert!(matches!(err, Error::Search(_)));
    }
}
