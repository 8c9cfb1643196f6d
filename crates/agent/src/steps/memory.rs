//! Memory step: settles the student profile for the run.

use async_trait::async_trait;
use eduguardian_core::{LessonState, LessonUpdate, Result, StepName};
use tracing::info;
use super::Step;

pub struct MemoryStep {
    default_profile: String,
}

impl MemoryStep {
    pub fn new(default_profile: impl Into<String>) -> Self {
        Self {
            default_profile: default_profile.into(),
        }
    }
}

/// Short display name of a profile: the part before a colon, else the
/// first sentence, capped at 40 characters.
fn profile_label(profile: &str) -> String {
    let head = profile
        .split_once(':')
        .map(|(name, _)| name)
        .or_else(|| profile.split_once('.').map(|(sentence, _)| sentence))
        .unwrap_or(profile)
        .trim();
    head.chars().take(40).collect()
}

#[async_trait]
impl Step for MemoryStep {
    fn name(&self) -> StepName {
        StepName::Memory
    }

    async fn run(&self, state: &LessonState) -> Result<LessonUpdate> {
        let profile = if state.student_profile.trim().is_empty() {
            self.default_profile.clone()
        } else {
            state.student_profile.clone()
        };
        let label = profile_label(&profile);
        info!(profile = %label, "Student profile loaded");

        Ok(LessonUpdate::new()
            .log(format!("🧠 **Memory:** Profile '{label}' loaded."))
            .student_profile(profile)
            .iterations(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eduguardian_core::{LessonRequest, StudentLevel};

    #[tokio::test]
    async fn keeps_supplied_profile() {
        let step = MemoryStep::new("Default learner.");
        let state = LessonState::from_request(
            &LessonRequest::new("q", StudentLevel::Primary)
                .with_profile("Krishna: Prefers Cricket analogies. Visual learner."),
        );
        let update = step.run(&state).await.unwrap();
        assert_eq!(
            update.student_profile.as_deref(),
            Some("Krishna: Prefers Cricket analogies. Visual learner.")
        );
        assert_eq!(update.log, vec!["🧠 **Memory:** Profile 'Krishna' loaded."]);
        assert_eq!(update.iterations, Some(0));
    }

    #[tokio::test]
    async fn falls_back_to_default_profile() {
        let step = MemoryStep::new("Curious learner. Likes space.");
        let mut state = LessonState::from_request(&LessonRequest::new("q", StudentLevel::Secondary));
        state.iterations = 3;
        let update = step.run(&state).await.unwrap();
        assert_eq!(update.student_profile.as_deref(), Some("Curious learner. Likes space."));
        assert_eq!(update.log, vec!["🧠 **Memory:** Profile 'Curious learner' loaded."]);
        assert_eq!(update.iterations, Some(0));
    }

    #[test]
    fn label_caps_length() {
        let long = "a".repeat(100);
        assert_eq!(profile_label(&long).len(), 40);
    }
}
