//! Checkpoint store implementations for EduGuardian.
//!
//! Every backend implements `eduguardian_core::Checkpointer`, keyed by
//! thread ID.

pub mod file_backend;
pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

use std::path::PathBuf;
use std::sync::Arc;
use eduguardian_core::{CheckpointError, Checkpointer};

pub use file_backend::FileCheckpointer;
pub use in_memory::InMemoryCheckpointer;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteCheckpointer;

/// Open the checkpoint backend named in configuration.
pub async fn build_from_config(
    config: &eduguardian_config::AppConfig,
) -> Result<Arc<dyn Checkpointer>, CheckpointError> {
    let path = config.checkpoint.path.clone();
    match config.checkpoint.backend.as_str() {
        "memory" => Ok(Arc::new(InMemoryCheckpointer::new())),
        "file" => {
            let path = path
                .map(PathBuf::from)
                .unwrap_or_else(FileCheckpointer::default_path);
            Ok(Arc::new(FileCheckpointer::new(path)))
        }
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let url = match path {
                Some(p) if p.starts_with("sqlite:") => p,
                other => {
                    let file = other.map(PathBuf::from).unwrap_or_else(|| {
                        eduguardian_config::AppConfig::config_dir().join("threads.db")
                    });
                    if let Some(parent) = file.parent() {
                        tokio::fs::create_dir_all(parent).await.map_err(|e| {
                            CheckpointError::Storage(format!(
                                "Failed to create checkpoint directory: {e}"
                            ))
                        })?;
                    }
                    format!("sqlite://{}", file.display())
                }
            };
            Ok(Arc::new(SqliteCheckpointer::new(&url).await?))
        }
        other => Err(CheckpointError::Storage(format!(
            "unknown checkpoint backend '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eduguardian_config::AppConfig;

    #[tokio::test]
    async fn default_backend_is_memory() {
        let store = build_from_config(&AppConfig::default()).await.unwrap();
        assert_eq!(store.name(), "memory");
    }

    #[tokio::test]
    async fn file_backend_uses_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.checkpoint.backend = "file".into();
        config.checkpoint.path = Some(dir.path().join("t.jsonl").display().to_string());
        let store = build_from_config(&config).await.unwrap();
        assert_eq!(store.name(), "file");
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn sqlite_backend_accepts_url() {
        let mut config = AppConfig::default();
        config.checkpoint.backend = "sqlite".into();
        config.checkpoint.path = Some("sqlite::memory:".into());
        let store = build_from_config(&config).await.unwrap();
        assert_eq!(store.name(), "sqlite");
    }

    #[tokio::test]
    async fn unknown_backend_is_rejected() {
        let mut config = AppConfig::default();
        config.checkpoint.backend = "redis".into();
        assert!(build_from_config(&config).await.is_err());
    }
}
