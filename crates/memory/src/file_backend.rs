//! File-based checkpoint store: JSON-lines on disk.
//!
//! Each line is one JSON-encoded `Checkpoint`, one per thread. Entries are
//! loaded on creation and the whole file is rewritten on every mutation.
//!
//! Storage location: `~/.eduguardian/threads.jsonl`

use async_trait::async_trait;
use eduguardian_core::checkpoint::{Checkpoint, Checkpointer, ThreadId};
use eduguardian_core::error::CheckpointError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

pub struct FileCheckpointer {
    path: PathBuf,
    threads: Arc<RwLock<BTreeMap<String, Checkpoint>>>,
    /// Held for the whole of a flush so file writes never interleave
    write_lock: Mutex<()>,
}

impl FileCheckpointer {
    /// Open the store at `path`. A missing file starts empty and is created
    /// on first write.
    pub fn new(path: PathBuf) -> Self {
        let threads = Self::load_from_disk(&path);
        debug!(path = %path.display(), count = threads.len(), "File checkpoint store loaded");
        Self {
            path,
            threads: Arc::new(RwLock::new(threads)),
            write_lock: Mutex::new(()),
        }
    }

    /// Default path: `~/.eduguardian/threads.jsonl`
    pub fn default_path() -> PathBuf {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".eduguardian").join("threads.jsonl")
    }

    fn load_from_disk(path: &Path) -> BTreeMap<String, Checkpoint> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return BTreeMap::new(),
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<Checkpoint>(line) {
                Ok(cp) => Some((cp.thread_id.0.clone(), cp)),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted checkpoint line");
                    None
                }
            })
            .collect()
    }

    /// Rewrite the file from the current map: snapshot under the write
    /// lock, write a sibling temp file, then rename it over the old one.
    async fn flush(&self) -> Result<(), CheckpointError> {
        let _writer = self.write_lock.lock().await;

        let content = {
            let threads = self.threads.read().await;
            let mut content = String::new();
            for cp in threads.values() {
                let line = serde_json::to_string(cp).map_err(|e| {
                    CheckpointError::Storage(format!("Failed to serialize checkpoint: {e}"))
                })?;
                content.push_str(&line);
                content.push('\n');
            }
            content
        };

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                CheckpointError::Storage(format!("Failed to create checkpoint directory: {e}"))
            })?;
        }

        let tmp = self.temp_path();
        tokio::fs::write(&tmp, &content).await.map_err(|e| {
            CheckpointError::Storage(format!("Failed to write checkpoint file: {e}"))
        })?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            CheckpointError::Storage(format!("Failed to replace checkpoint file: {e}"))
        })?;

        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "threads.jsonl".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl Checkpointer for FileCheckpointer {
    fn name(&self) -> &str {
        "file"
    }

    async fn get(&self, thread_id: &ThreadId) -> Result<Option<Checkpoint>, CheckpointError> {
        Ok(self.threads.read().await.get(thread_id.as_str()).cloned())
    }

    async fn put(&self, checkpoint: Checkpoint) -> Result<(), CheckpointError> {
        self.threads
            .write()
            .await
            .insert(checkpoint.thread_id.0.clone(), checkpoint);
        self.flush().await
    }

    async fn delete(&self, thread_id: &ThreadId) -> Result<bool, CheckpointError> {
        let removed = self.threads.write().await.remove(thread_id.as_str()).is_some();
        if removed {
            self.flush().await?;
        }
        Ok(removed)
    }

    async fn list(&self) -> Result<Vec<ThreadId>, CheckpointError> {
        Ok(self
            .threads
            .read()
            .await
            .keys()
            .map(|k| ThreadId::from(k.as_str()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eduguardian_core::lesson::{LessonRequest, LessonState, StudentLevel};

    fn checkpoint(thread: &str, query: &str) -> Checkpoint {
        let state = LessonState::from_request(&LessonRequest::new(query, StudentLevel::Primary));
        Checkpoint::new(ThreadId::from(thread), "run-1", state)
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("threads.jsonl");

        {
            let store = FileCheckpointer::new(path.clone());
            store.put(checkpoint("alpha", "What is photosynthesis?")).await.unwrap();
            store.put(checkpoint("beta", "Explain gravity")).await.unwrap();
        }

        let reopened = FileCheckpointer::new(path);
        let cp = reopened.get(&ThreadId::from("alpha")).await.unwrap().unwrap();
        assert_eq!(cp.state.query, "What is photosynthesis?");
        assert_eq!(
            reopened.list().await.unwrap(),
            vec![ThreadId::from("alpha"), ThreadId::from("beta")]
        );
    }

    #[tokio::test]
    async fn corrupted_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("threads.jsonl");
        let good = serde_json::to_string(&checkpoint("ok", "q")).unwrap();
        std::fs::write(&path, format!("{{not json\n{good}\n")).unwrap();

        let store = FileCheckpointer::new(path);
        assert_eq!(store.list().await.unwrap(), vec![ThreadId::from("ok")]);
    }

    #[tokio::test]
    async fn concurrent_puts_all_reach_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("threads.jsonl");
        let store = Arc::new(FileCheckpointer::new(path.clone()));

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store.put(checkpoint(&format!("thread-{i:02}"), "Explain gravity")).await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let reopened = FileCheckpointer::new(path.clone());
        assert_eq!(reopened.list().await.unwrap().len(), 32);
        assert!(!store.temp_path().exists());
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 32);
    }

    #[tokio::test]
    async fn delete_rewrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("threads.jsonl");
        let store = FileCheckpointer::new(path.clone());
        store.put(checkpoint("gone", "q")).await.unwrap();
        assert!(store.delete(&ThreadId::from("gone")).await.unwrap());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.trim().is_empty());
        assert!(!store.delete(&ThreadId::from("gone")).await.unwrap());
    }
}
