//! Scripted collaborators for step and pipeline tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use eduguardian_core::error::{ProviderError, SearchError};
use eduguardian_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use eduguardian_core::search::{SearchProvider, SearchRequest, SearchResponse, SearchResult};
use eduguardian_core::Message;
use crate::prompts::{JUDGE_PREFIX, QUIZ_PREFIX};

/// Which step a prompt came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Tutor,
    Judge,
    Quiz,
}

impl PromptKind {
    pub fn of(prompt: &str) -> Self {
        if prompt.starts_with(JUDGE_PREFIX) {
            Self::Judge
        } else if prompt.starts_with(QUIZ_PREFIX) {
            Self::Quiz
        } else {
            Self::Tutor
        }
    }
}

/// A provider that answers each step with scripted text.
///
/// Judge replies are consumed in order; the last one repeats once the
/// queue is down to a single entry. With no judge replies it answers "0.9".
pub struct ScriptedProvider {
    tutor_reply: String,
    quiz_reply: String,
    judge_replies: Mutex<VecDeque<String>>,
    failing: Option<PromptKind>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            tutor_reply: "Have you ever wondered how a bowler gets swing? **Key term** explained.".into(),
            quiz_reply: "Which statement is correct? A) ... B) ... C) ... D) ...".into(),
            judge_replies: Mutex::new(VecDeque::new()),
            failing: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_tutor_reply(mut self, reply: &str) -> Self {
        self.tutor_reply = reply.into();
        self
    }

    pub fn with_quiz_reply(mut self, reply: &str) -> Self {
        self.quiz_reply = reply.into();
        self
    }

    pub fn with_judge_replies(self, replies: &[&str]) -> Self {
        *self.judge_replies.lock().unwrap() = replies.iter().map(|r| r.to_string()).collect();
        self
    }

    /// Make every call of the given kind fail.
    pub fn failing_on(mut self, kind: PromptKind) -> Self {
        self.failing = Some(kind);
        self
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn prompts_of(&self, kind: PromptKind) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(|r| r.messages.last().map(|m| m.content.clone()))
            .filter(|p| PromptKind::of(p) == kind)
            .collect()
    }

    pub fn calls_of(&self, kind: PromptKind) -> usize {
        self.prompts_of(kind).len()
    }

    fn next_judge_reply(&self) -> String {
        let mut queue = self.judge_replies.lock().unwrap();
        if queue.len() > 1 {
            queue.pop_front().unwrap_or_default()
        } else {
            queue.front().cloned().unwrap_or_else(|| "0.9".into())
        }
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let prompt = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.requests.lock().unwrap().push(request);

        let kind = PromptKind::of(&prompt);
        if self.failing == Some(kind) {
            return Err(ProviderError::ApiError {
                status_code: 503,
                message: "scripted outage".into(),
            });
        }

        let text = match kind {
            PromptKind::Tutor => self.tutor_reply.clone(),
            PromptKind::Judge => self.next_judge_reply(),
            PromptKind::Quiz => self.quiz_reply.clone(),
        };
        Ok(make_text_response(&text))
    }
}

/// A provider that never answers within any reasonable timeout.
pub struct SlowProvider {
    delay: Duration,
}

impl SlowProvider {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait::async_trait]
impl Provider for SlowProvider {
    fn name(&self) -> &str {
        "slow"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        tokio::time::sleep(self.delay).await;
        Ok(make_text_response("too late"))
    }
}

pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// A search backend with a fixed answer.
pub struct ScriptedSearch {
    outcome: Result<SearchResponse, SearchError>,
    requests: Mutex<Vec<SearchRequest>>,
}

impl ScriptedSearch {
    pub fn with_results(bodies: &[&str], images: &[&str]) -> Self {
        let response = SearchResponse {
            results: bodies
                .iter()
                .enumerate()
                .map(|(i, body)| SearchResult {
                    title: format!("Result {}", i + 1),
                    url: format!("https://example.com/{}", i + 1),
                    content: body.to_string(),
                })
                .collect(),
            images: images.iter().map(|s| s.to_string()).collect(),
        };
        Self {
            outcome: Ok(response),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            outcome: Err(SearchError::Network("connection refused".into())),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SearchProvider for ScriptedSearch {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn search(&self, request: SearchRequest) -> Result<SearchResponse, SearchError> {
        self.requests.lock().unwrap().push(request);
        self.outcome.clone()
    }
}
