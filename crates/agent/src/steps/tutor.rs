//! Tutor step: drafts the lesson.

use async_trait::async_trait;
use eduguardian_core::{LessonState, LessonUpdate, Result, StepName};
use tracing::info;
use crate::prompts;
use super::{Generator, Step};

pub struct TutorStep {
    generator: Generator,
}

impl TutorStep {
    pub fn new(generator: Generator) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Step for TutorStep {
    fn name(&self) -> StepName {
        StepName::Tutor
    }

    async fn run(&self, state: &LessonState) -> Result<LessonUpdate> {
        let draft = state.iterations + 1;
        let lesson = self.generator.generate(prompts::tutor(state)).await?;
        info!(draft, chars = lesson.len(), "Lesson drafted");

        Ok(LessonUpdate::new()
            .log(format!("🎓 **Tutor:** Generated lesson (Draft {draft})."))
            .response(lesson)
            .iterations(draft))
    }
}
