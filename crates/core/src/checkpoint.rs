//! Checkpointer trait: per-thread persistence of lesson state.
//!
//! Each thread (chat session) keeps one checkpoint: the latest state record,
//! the last step that completed, and a short history of finished lessons.
//! A new run on the same thread reads it back to resume the conversation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::error::CheckpointError;
use crate::lesson::{LessonState, SourceType, StepName};

/// Opaque identifier of a conversation thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadId(pub String);

impl ThreadId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ThreadId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for ThreadId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ThreadId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Summary of one finished lesson on a thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonTurn {
    pub query: String,
    pub response: String,
    pub quiz_question: String,
    #[serde(default)]
    pub image_url: String,
    pub source_type: SourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faithfulness_score: Option<f64>,
    pub tutor_iterations: u32,
    pub finished_at: DateTime<Utc>,
}

impl LessonTurn {
    pub fn from_state(state: &LessonState) -> Self {
        Self {
            query: state.query.clone(),
            response: state.response.clone(),
            quiz_question: state.quiz_question.clone(),
            image_url: state.image_url.clone(),
            source_type: state.source_type,
            faithfulness_score: state.faithfulness_score,
            tutor_iterations: state.iterations,
            finished_at: Utc::now(),
        }
    }
}

/// The stored snapshot of a thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub thread_id: ThreadId,

    /// The run that wrote this checkpoint
    pub run_id: String,

    /// Latest state record
    pub state: LessonState,

    /// Last step that completed in that run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_step: Option<StepName>,

    /// Whether the run reached the end of the graph
    #[serde(default)]
    pub completed: bool,

    /// Finished lessons on this thread, oldest first
    #[serde(default)]
    pub turns: Vec<LessonTurn>,

    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(thread_id: ThreadId, run_id: impl Into<String>, state: LessonState) -> Self {
        Self {
            thread_id,
            run_id: run_id.into(),
            state,
            last_step: None,
            completed: false,
            turns: Vec::new(),
            updated_at: Utc::now(),
        }
    }
}

/// The core Checkpointer trait.
///
/// Implementations: in-memory (default), JSON file, SQLite.
/// A single `get` or `put` is atomic per thread; concurrent writers to the
/// same thread resolve last-writer-wins.
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// The backend name (e.g., "memory", "file", "sqlite").
    fn name(&self) -> &str;

    /// Load the checkpoint of a thread.
    async fn get(&self, thread_id: &ThreadId) -> std::result::Result<Option<Checkpoint>, CheckpointError>;

    /// Store (replace) the checkpoint of a thread.
    async fn put(&self, checkpoint: Checkpoint) -> std::result::Result<(), CheckpointError>;

    /// Remove a thread's checkpoint. Returns whether one existed.
    async fn delete(&self, thread_id: &ThreadId) -> std::result::Result<bool, CheckpointError>;

    /// All thread IDs with a stored checkpoint.
    async fn list(&self) -> std::result::Result<Vec<ThreadId>, CheckpointError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lesson::{LessonRequest, StudentLevel};

    #[test]
    fn thread_id_converts_from_str_and_string() {
        let borrowed: ThreadId = "conclave".into();
        let owned = ThreadId::from(String::from("conclave"));
        assert_eq!(borrowed, owned);
        assert_eq!(owned.as_str(), "conclave");
        assert_ne!(ThreadId::new(), ThreadId::new());
    }

    #[test]
    fn checkpoint_serialization_roundtrip() {
        let state = LessonState::from_request(&LessonRequest::new(
            "What is photosynthesis?",
            StudentLevel::Primary,
        ));
        let mut cp = Checkpoint::new(ThreadId::from("conclave"), "run-1", state);
        cp.last_step = Some(StepName::QuizMaster);
        cp.turns.push(LessonTurn::from_state(&cp.state));

        let json = serde_json::to_string(&cp).unwrap();
        assert!(json.contains("quiz_master"));
        let back: Checkpoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back.thread_id, ThreadId::from("conclave"));
        assert_eq!(back.turns.len(), 1);
        assert_eq!(back.state.query, "What is photosynthesis?");
    }

    #[test]
    fn thread_ids_are_unique() {
        assert_ne!(ThreadId::new(), ThreadId::new());
    }
}
