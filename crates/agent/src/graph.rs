//! Routing between steps.
//!
//! The lesson graph:
//!
//! ```text
//! START -> memory -> sentinel -+-> tutor -> judge -+-> quiz_master -> END
//!                              |     ^             |
//!                              v     |             |
//!                         web_search  +-- retry ---+
//! ```
//!
//! Every decision is a pure function over a [`RouteSnapshot`] taken after the
//! step's update has been merged.

use eduguardian_core::{LessonState, StepName};

/// Hard ceiling on steps executed in one run.
///
/// Fits the longest run a valid config allows: memory, sentinel, web search,
/// quiz master, plus a tutor and judge pair per draft.
pub const STEP_LIMIT: usize = 4 + 2 * eduguardian_config::MAX_TUTOR_ITERATIONS as usize;

pub const VERIFIED_FEEDBACK: &str = "Verified";
pub const REVISE_FEEDBACK: &str = "Hallucination detected. Revising...";

/// The fields routing decisions read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteSnapshot {
    pub has_context: bool,
    pub faithfulness_score: Option<f64>,
    pub iterations: u32,
}

impl RouteSnapshot {
    pub fn of(state: &LessonState) -> Self {
        Self {
            has_context: !state.context.is_empty(),
            faithfulness_score: state.faithfulness_score,
            iterations: state.iterations,
        }
    }
}

/// Bounds on the Tutor/Judge retry cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Scores below this send the lesson back to the Tutor
    pub threshold: f64,
    /// Tutor invocations allowed per run
    pub max_tutor_iterations: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            threshold: 0.7,
            max_tutor_iterations: 2,
        }
    }
}

impl RetryPolicy {
    pub fn should_retry(&self, score: f64, iterations: u32) -> bool {
        score < self.threshold && iterations < self.max_tutor_iterations
    }

    /// Judge feedback for a score. A score equal to the threshold is not
    /// verified but does not trigger a retry either.
    pub fn feedback(&self, score: f64) -> &'static str {
        if score > self.threshold {
            VERIFIED_FEEDBACK
        } else {
            REVISE_FEEDBACK
        }
    }
}

pub fn route_after_sentinel(snapshot: &RouteSnapshot) -> StepName {
    if snapshot.has_context {
        StepName::Tutor
    } else {
        StepName::WebSearch
    }
}

pub fn route_after_judge(snapshot: &RouteSnapshot, policy: &RetryPolicy) -> StepName {
    match snapshot.faithfulness_score {
        Some(score) if policy.should_retry(score, snapshot.iterations) => StepName::Tutor,
        _ => StepName::QuizMaster,
    }
}

/// The step that follows `current`, or `None` at the end of the graph.
pub fn next_step(current: StepName, snapshot: &RouteSnapshot, policy: &RetryPolicy) -> Option<StepName> {
    match current {
        StepName::Memory => Some(StepName::Sentinel),
        StepName::Sentinel => Some(route_after_sentinel(snapshot)),
        StepName::WebSearch => Some(StepName::Tutor),
        StepName::Tutor => Some(StepName::Judge),
        StepName::Judge => Some(route_after_judge(snapshot, policy)),
        StepName::QuizMaster => None,
    }
}
