//! Pipeline event system: observe runs without coupling to the pipeline.
//!
//! Events are published as a run progresses through the lesson graph.
//! The CLI and tests subscribe to follow steps as they complete.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use crate::lesson::StepName;

/// All events emitted by a lesson run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// A run was accepted at the entry point
    RunStarted {
        thread_id: String,
        run_id: String,
        timestamp: DateTime<Utc>,
    },

    /// A step finished and its update was merged
    StepCompleted {
        run_id: String,
        step: StepName,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// The run reached the end of the graph
    RunFinished {
        run_id: String,
        tutor_iterations: u32,
        faithfulness_score: Option<f64>,
        timestamp: DateTime<Utc>,
    },

    /// A step failed and the run was aborted
    RunFailed {
        run_id: String,
        step: StepName,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for pipeline events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<PipelineEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: PipelineEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<PipelineEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
