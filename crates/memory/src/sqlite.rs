//! SQLite checkpoint store.
//!
//! One row per thread in the `checkpoints` table. The state record and the
//! finished-lesson history are stored as JSON text columns.

use async_trait::async_trait;
use chrono::Utc;
use eduguardian_core::checkpoint::{Checkpoint, Checkpointer, ThreadId};
use eduguardian_core::error::CheckpointError;
use eduguardian_core::lesson::StepName;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

pub struct SqliteCheckpointer {
    pool: SqlitePool,
}

impl SqliteCheckpointer {
    /// Open (or create) the database at `path`.
    ///
    /// Pass `"sqlite::memory:"` for an ephemeral in-process database.
    pub async fn new(path: &str) -> Result<Self, CheckpointError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| CheckpointError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        // A single connection keeps `sqlite::memory:` databases shared
        let max_connections = if path.contains(":memory:") { 1 } else { 4 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| CheckpointError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite checkpoint store initialized at {path}");
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), CheckpointError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS checkpoints (
                thread_id   TEXT PRIMARY KEY NOT NULL,
                run_id      TEXT NOT NULL,
                state       TEXT NOT NULL,
                last_step   TEXT,
                completed   INTEGER NOT NULL DEFAULT 0,
                turns       TEXT NOT NULL DEFAULT '[]',
                updated_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| CheckpointError::MigrationFailed(format!("checkpoints table: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn row_to_checkpoint(row: &sqlx::sqlite::SqliteRow) -> Result<Checkpoint, CheckpointError> {
        let thread_id: String = row
            .try_get("thread_id")
            .map_err(|e| CheckpointError::QueryFailed(format!("thread_id column: {e}")))?;
        let run_id: String = row
            .try_get("run_id")
            .map_err(|e| CheckpointError::QueryFailed(format!("run_id column: {e}")))?;
        let state_json: String = row
            .try_get("state")
            .map_err(|e| CheckpointError::QueryFailed(format!("state column: {e}")))?;
        let last_step: Option<String> = row
            .try_get("last_step")
            .map_err(|e| CheckpointError::QueryFailed(format!("last_step column: {e}")))?;
        let completed: i64 = row
            .try_get("completed")
            .map_err(|e| CheckpointError::QueryFailed(format!("completed column: {e}")))?;
        let turns_json: String = row
            .try_get("turns")
            .map_err(|e| CheckpointError::QueryFailed(format!("turns column: {e}")))?;
        let updated_at_str: String = row
            .try_get("updated_at")
            .map_err(|e| CheckpointError::QueryFailed(format!("updated_at column: {e}")))?;

        let corrupted = |reason: String| CheckpointError::Corrupted {
            thread_id: thread_id.clone(),
            reason,
        };

        let state = serde_json::from_str(&state_json).map_err(|e| corrupted(format!("state: {e}")))?;
        let turns = serde_json::from_str(&turns_json).map_err(|e| corrupted(format!("turns: {e}")))?;
        let last_step = last_step
            .map(|s| serde_json::from_value::<StepName>(serde_json::Value::String(s)))
            .transpose()
            .map_err(|e| corrupted(format!("last_step: {e}")))?;

        let updated_at = chrono::DateTime::parse_from_rfc3339(&updated_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(Checkpoint {
            thread_id: ThreadId::from(thread_id),
            run_id,
            state,
            last_step,
            completed: completed != 0,
            turns,
            updated_at,
        })
    }
}

#[async_trait]
impl Checkpointer for SqliteCheckpointer {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn get(&self, thread_id: &ThreadId) -> Result<Option<Checkpoint>, CheckpointError> {
        let row = sqlx::query("SELECT * FROM checkpoints WHERE thread_id = ?1")
            .bind(thread_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CheckpointError::QueryFailed(format!("SELECT failed: {e}")))?;

        row.as_ref().map(Self::row_to_checkpoint).transpose()
    }

    async fn put(&self, checkpoint: Checkpoint) -> Result<(), CheckpointError> {
        let state_json = serde_json::to_string(&checkpoint.state)
            .map_err(|e| CheckpointError::Storage(format!("State serialization: {e}")))?;
        let turns_json = serde_json::to_string(&checkpoint.turns)
            .map_err(|e| CheckpointError::Storage(format!("Turns serialization: {e}")))?;
        let last_step = checkpoint.last_step.map(|s| s.as_str());

        sqlx::query(
            r#"
            INSERT INTO checkpoints (thread_id, run_id, state, last_step, completed, turns, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(thread_id) DO UPDATE SET
                run_id = excluded.run_id,
                state = excluded.state,
                last_step = excluded.last_step,
                completed = excluded.completed,
                turns = excluded.turns,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(checkpoint.thread_id.as_str())
        .bind(&checkpoint.run_id)
        .bind(&state_json)
        .bind(last_step)
        .bind(i64::from(checkpoint.completed))
        .bind(&turns_json)
        .bind(checkpoint.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| CheckpointError::Storage(format!("INSERT failed: {e}")))?;

        debug!(thread_id = %checkpoint.thread_id, "Stored checkpoint");
        Ok(())
    }

    async fn delete(&self, thread_id: &ThreadId) -> Result<bool, CheckpointError> {
        let result = sqlx::query("DELETE FROM checkpoints WHERE thread_id = ?1")
            .bind(thread_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| CheckpointError::Storage(format!("DELETE failed: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<ThreadId>, CheckpointError> {
        let rows = sqlx::query("SELECT thread_id FROM checkpoints ORDER BY thread_id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CheckpointError::QueryFailed(format!("List failed: {e}")))?;

        rows.iter()
            .map(|row| {
                row.try_get::<String, _>("thread_id")
                    .map(ThreadId::from)
                    .map_err(|e| CheckpointError::QueryFailed(format!("thread_id column: {e}")))
            })
            .collect()
    }
}
