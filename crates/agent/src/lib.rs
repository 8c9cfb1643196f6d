//! The EduGuardian lesson pipeline.
//!
//! A run walks a small graph of steps over one [`LessonState`]:
//!
//! 1. **Memory** settles the student profile
//! 2. **Sentinel** checks the local knowledge table
//! 3. **Web Search** fetches context when nothing local matched
//! 4. **Tutor** drafts the lesson
//! 5. **Judge** scores its grounding; low scores send it back to the Tutor
//!    while the retry budget lasts
//! 6. **Quiz Master** closes with one multiple-choice question
//!
//! [`LessonState`]: eduguardian_core::LessonState

pub mod graph;
pub mod pipeline;
pub mod prompts;
pub mod steps;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use graph::{RetryPolicy, RouteSnapshot, STEP_LIMIT};
pub use pipeline::{LessonPipeline, PipelineSettings, RunFailure, build_from_config};
pub use steps::{Generator, Step};
