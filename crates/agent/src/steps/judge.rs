//! Judge step: scores how well the lesson is grounded in the context.

use async_trait::async_trait;
use eduguardian_core::{LessonState, LessonUpdate, Result, StepName};
use tracing::{info, warn};
use crate::graph::RetryPolicy;
use crate::prompts;
use super::{Generator, Step};

pub struct JudgeStep {
    generator: Generator,
    policy: RetryPolicy,
    fallback_score: f64,
}

impl JudgeStep {
    pub fn new(generator: Generator, policy: RetryPolicy, fallback_score: f64) -> Self {
        Self {
            generator,
            policy,
            fallback_score,
        }
    }
}

/// Extract a score from a model reply: keep ASCII digits and dots, parse,
/// clamp into [0, 1]. `None` when nothing parseable remains.
pub fn parse_score(reply: &str) -> Option<f64> {
    let digits: String = reply
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse::<f64>().ok().map(|score| score.clamp(0.0, 1.0))
}

#[async_trait]
impl Step for JudgeStep {
    fn name(&self) -> StepName {
        StepName::Judge
    }

    async fn run(&self, state: &LessonState) -> Result<LessonUpdate> {
        let prompt = prompts::judge(&state.context, &state.response);

        let score = match self.generator.generate(prompt).await {
            Ok(reply) => parse_score(&reply).unwrap_or_else(|| {
                warn!(reply = %reply, fallback = self.fallback_score, "Unparseable judge score");
                self.fallback_score
            }),
            Err(e) => {
                warn!(error = %e, fallback = self.fallback_score, "Judge call failed");
                self.fallback_score
            }
        };

        let feedback = self.policy.feedback(score);
        info!(score, feedback, "Lesson judged");

        Ok(LessonUpdate::new()
            .log("⚖️ **Judge:** Evaluating lesson quality...")
            .faithfulness(score, feedback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::graph::{REVISE_FEEDBACK, VERIFIED_FEEDBACK};
    use crate::test_helpers::{PromptKind, ScriptedProvider};

    fn judge(provider: Arc<ScriptedProvider>) -> JudgeStep {
        JudgeStep::new(Generator::new(provider, "m"), RetryPolicy::default(), 0.9)
    }

    fn state() -> LessonState {
        LessonState {
            context: "Gravity pulls mass together.".into(),
            response: "Gravity is a force.".into(),
            ..LessonState::default()
        }
    }

    #[test]
    fn parse_score_filters_noise() {
        assert_eq!(parse_score(" 0.85 "), Some(0.85));
        assert_eq!(parse_score("Score: 0.4"), Some(0.4));
        assert_eq!(parse_score("1"), Some(1.0));
        assert_eq!(parse_score("N/A"), None);
        assert_eq!(parse_score(""), None);
        assert_eq!(parse_score("0.8.1"), None);
    }

    #[test]
    fn parse_score_clamps() {
        assert_eq!(parse_score("8"), Some(1.0));
        assert_eq!(parse_score("-0.3"), Some(0.3));
    }

    #[tokio::test]
    async fn unparseable_reply_falls_back_to_verified() {
        let provider = Arc::new(ScriptedProvider::new().with_judge_replies(&["N/A"]));
        let update = judge(provider).run(&state()).await.unwrap();
        assert_eq!(update.faithfulness_score, Some(0.9));
        assert_eq!(update.judge_feedback.as_deref(), Some(VERIFIED_FEEDBACK));
    }

    #[tokio::test]
    async fn low_score_requests_revision() {
        let provider = Arc::new(ScriptedProvider::new().with_judge_replies(&["0.5"]));
        let update = judge(provider).run(&state()).await.unwrap();
        assert_eq!(update.faithfulness_score, Some(0.5));
        assert_eq!(update.judge_feedback.as_deref(), Some(REVISE_FEEDBACK));
        assert_eq!(update.log, vec!["⚖️ **Judge:** Evaluating lesson quality..."]);
    }

    #[tokio::test]
    async fn provider_failure_uses_fallback() {
        let provider = Arc::new(ScriptedProvider::new().failing_on(PromptKind::Judge));
        let update = judge(provider).run(&state()).await.unwrap();
        assert_eq!(update.faithfulness_score, Some(0.9));
    }

    #[tokio::test]
    async fn prompt_carries_context_and_lesson() {
        let provider = Arc::new(ScriptedProvider::new());
        judge(provider.clone()).run(&state()).await.unwrap();
        let prompt = &provider.prompts_of(PromptKind::Judge)[0];
        assert!(prompt.ends_with("Context: Gravity pulls mass together.\nLesson: Gravity is a force."));
    }

    #[tokio::test]
    async fn identical_state_gives_identical_update() {
        let provider = Arc::new(ScriptedProvider::new().with_judge_replies(&["0.6"]));
        let step = judge(provider);
        assert_eq!(step.run(&state()).await.unwrap(), step.run(&state()).await.unwrap());
    }
}
