//! In-memory checkpoint store, the default backend.
//!
//! Checkpoints live for the lifetime of the process.

use async_trait::async_trait;
use eduguardian_core::checkpoint::{Checkpoint, Checkpointer, ThreadId};
use eduguardian_core::error::CheckpointError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryCheckpointer {
    threads: Arc<RwLock<HashMap<ThreadId, Checkpoint>>>,
}

impl InMemoryCheckpointer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Checkpointer for InMemoryCheckpointer {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, thread_id: &ThreadId) -> Result<Option<Checkpoint>, CheckpointError> {
        Ok(self.threads.read().await.get(thread_id).cloned())
    }

    async fn put(&self, checkpoint: Checkpoint) -> Result<(), CheckpointError> {
        self.threads
            .write()
            .await
            .insert(checkpoint.thread_id.clone(), checkpoint);
        Ok(())
    }

    async fn delete(&self, thread_id: &ThreadId) -> Result<bool, CheckpointError> {
        Ok(self.threads.write().await.remove(thread_id).is_some())
    }

    async fn list(&self) -> Result<Vec<ThreadId>, CheckpointError> {
        let mut ids: Vec<ThreadId> = self.threads.read().await.keys().cloned().collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(ids)
    }
}
