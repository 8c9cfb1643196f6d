//! Sentinel step: checks the local knowledge table before going online.

use async_trait::async_trait;
use eduguardian_config::LocalFact;
use eduguardian_core::{LessonState, LessonUpdate, Result, SourceType, StepName};
use tracing::debug;
use super::Step;

pub struct SentinelStep {
    knowledge: Vec<LocalFact>,
}

impl SentinelStep {
    pub fn new(knowledge: Vec<LocalFact>) -> Self {
        Self { knowledge }
    }

    /// First fact whose trigger appears in the query, case-insensitively.
    fn lookup(&self, query: &str) -> Option<&LocalFact> {
        let query = query.to_lowercase();
        self.knowledge
            .iter()
            .filter(|fact| !fact.trigger.trim().is_empty())
            .find(|fact| query.contains(&fact.trigger.to_lowercase()))
    }
}

#[async_trait]
impl Step for SentinelStep {
    fn name(&self) -> StepName {
        StepName::Sentinel
    }

    async fn run(&self, state: &LessonState) -> Result<LessonUpdate> {
        let update = LessonUpdate::new().log("🕵️ **Sentinel:** Checking local knowledge base...");

        Ok(match self.lookup(&state.query) {
            Some(fact) => {
                debug!(trigger = %fact.trigger, "Local knowledge hit");
                update.context(fact.fact.clone()).source_type(SourceType::Local)
            }
            None => update.context("").source_type(SourceType::None),
        })
    }
}
