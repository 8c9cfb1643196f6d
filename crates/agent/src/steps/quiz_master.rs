//! Quiz Master step: one multiple-choice question on the final lesson.

use async_trait::async_trait;
use eduguardian_core::{LessonState, LessonUpdate, Result, StepName};
use tracing::info;
use crate::prompts;
use super::{Generator, Step};

pub struct QuizMasterStep {
    generator: Generator,
}

impl QuizMasterStep {
    pub fn new(generator: Generator) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Step for QuizMasterStep {
    fn name(&self) -> StepName {
        StepName::QuizMaster
    }

    async fn run(&self, state: &LessonState) -> Result<LessonUpdate> {
        let quiz = self.generator.generate(prompts::quiz(&state.response)).await?;
        info!(chars = quiz.len(), "Quiz question ready");

        Ok(LessonUpdate::new()
            .log("📝 **Quiz Master:** Crafting challenge...")
            .quiz_question(quiz))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::test_helpers::{PromptKind, ScriptedProvider};
    use eduguardian_core::Error;

    fn state() -> LessonState {
        LessonState {
            response: "Plants turn sunlight into glucose.".into(),
            ..LessonState::default()
        }
    }

    #[tokio::test]
    async fn quiz_is_grounded_in_response() {
        let provider = Arc::new(ScriptedProvider::new().with_quiz_reply("What do plants make? A) Glucose B) Salt"));
        let step = QuizMasterStep::new(Generator::new(provider.clone(), "m"));
        let update = step.run(&state()).await.unwrap();

        assert_eq!(
            update.quiz_question.as_deref(),
            Some("What do plants make? A) Glucose B) Salt")
        );
        assert_eq!(
            provider.prompts_of(PromptKind::Quiz),
            vec!["Generate 1 MCQ based on: Plants turn sunlight into glucose."]
        );
    }

    #[tokio::test]
    async fn identical_state_gives_identical_update() {
        let provider = Arc::new(ScriptedProvider::new());
        let step = QuizMasterStep::new(Generator::new(provider, "m"));
        assert_eq!(step.run(&state()).await.unwrap(), step.run(&state()).await.unwrap());
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let provider = Arc::new(ScriptedProvider::new().failing_on(PromptKind::Quiz));
        let step = QuizMasterStep::new(Generator::new(provider, "m"));
        assert!(matches!(step.run(&state()).await, Err(Error::Provider(_))));
    }
}
