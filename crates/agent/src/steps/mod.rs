//! The six lesson steps.
//!
//! Each step reads the current [`LessonState`] and returns a
//! [`LessonUpdate`]; the pipeline merges updates and picks the next step.
//! Steps hold no per-run state, so running one twice on the same state with
//! the same collaborator replies yields the same update.

pub mod judge;
pub mod memory;
pub mod quiz_master;
pub mod sentinel;
pub mod tutor;
pub mod web_search;

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use eduguardian_core::error::ProviderError;
use eduguardian_core::{LessonState, LessonUpdate, Message, Provider, ProviderRequest, Result, StepName};
use tracing::debug;

pub use judge::JudgeStep;
pub use memory::MemoryStep;
pub use quiz_master::QuizMasterStep;
pub use sentinel::SentinelStep;
pub use tutor::TutorStep;
pub use web_search::WebSearchStep;

/// One node of the lesson graph.
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> StepName;

    async fn run(&self, state: &LessonState) -> Result<LessonUpdate>;
}

/// Shared access to the text-generation collaborator.
///
/// Sends a single user prompt and returns the reply text. Every call is
/// bounded by `timeout`.
#[derive(Clone)]
pub struct Generator {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    timeout: Duration,
}

impl Generator {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.3,
            max_tokens: None,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn generate(&self, prompt: String) -> std::result::Result<String, ProviderError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompt)],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stop: vec![],
        };

        debug!(provider = %self.provider.name(), model = %self.model, "Requesting completion");

        match tokio::time::timeout(self.timeout, self.provider.complete(request)).await {
            Ok(result) => result.map(|response| response.message.content),
            Err(_) => Err(ProviderError::Timeout(format!(
                "no reply from '{}' within {}s",
                self.provider.name(),
                self.timeout.as_secs()
            ))),
        }
    }
}
