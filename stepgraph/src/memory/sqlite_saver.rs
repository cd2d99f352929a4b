//! SQLite-backed checkpointer (SqliteSaver). Persistent across process restarts.
//!
//! One row per thread: `{ state, position, subgraph_states, pending_interrupt }`
//! plus metadata.
//! `INSERT OR REPLACE` keeps only the latest snapshot.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};

use crate::memory::checkpoint::{Checkpoint, CheckpointMetadata, CheckpointSource, PendingInterrupt};
use crate::memory::checkpointer::{thread_id_required, CheckpointError, Checkpointer};
use crate::memory::config::RunnableConfig;
use crate::memory::serializer::{JsonSerializer, Serializer};
use crate::state::StateRecord;

fn created_at_to_i64(t: &Option<SystemTime>) -> Option<i64> {
    t.as_ref()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok().map(|d| d.as_millis() as i64))
}

fn i64_to_created_at(v: Option<i64>) -> Option<SystemTime> {
    v.and_then(|ms| UNIX_EPOCH.checked_add(Duration::from_millis(ms as u64)))
}

fn storage(e: impl std::fmt::Display) -> CheckpointError {
    CheckpointError::Storage(e.to_string())
}

type RowData = (
    String,
    String,
    Vec<u8>,
    String,
    String,
    Option<Vec<u8>>,
    String,
    i64,
    Option<i64>,
);

/// SQLite-backed checkpointer. Key: thread_id.
///
/// Persistent; for single-node use. Uses spawn_blocking for async.
///
/// **Interaction**: Used as `Arc<dyn Checkpointer>` in `StateGraph::compile_with_checkpointer`.
pub struct SqliteSaver {
    db_path: PathBuf,
    state_serializer: Arc<dyn Serializer<StateRecord>>,
    interrupt_serializer: Arc<dyn Serializer<PendingInterrupt>>,
}

impl SqliteSaver {
    /// Opens (or creates) the database with JSON payloads and ensures the table exists.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, CheckpointError> {
        Self::with_serializers(path, Arc::new(JsonSerializer), Arc::new(JsonSerializer))
    }

    /// Like [`new`](Self::new) with custom payload serializers.
    pub fn with_serializers(
        path: impl AsRef<Path>,
        state_serializer: Arc<dyn Serializer<StateRecord>>,
        interrupt_serializer: Arc<dyn Serializer<PendingInterrupt>>,
    ) -> Result<Self, CheckpointError> {
        let db_path = path.as_ref().to_path_buf();
        let conn = rusqlite::Connection::open(&db_path).map_err(storage)?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS checkpoints (
                thread_id TEXT PRIMARY KEY NOT NULL,
                checkpoint_id TEXT NOT NULL,
                ts TEXT NOT NULL,
                state BLOB NOT NULL,
                position TEXT NOT NULL,
                subgraph_states TEXT NOT NULL,
                pending_interrupt BLOB,
                metadata_source TEXT NOT NULL,
                metadata_step INTEGER NOT NULL,
                metadata_created_at INTEGER
            )
            "#,
            [],
        )
        .map_err(storage)?;
        Ok(Self {
            db_path,
            state_serializer,
            interrupt_serializer,
        })
    }
}

#[async_trait]
impl Checkpointer for SqliteSaver {
    async fn put(
        &self,
        config: &RunnableConfig,
        checkpoint: &Checkpoint,
    ) -> Result<String, CheckpointError> {
        let thread_id = thread_id_required(config)?.to_string();
        let state = self.state_serializer.serialize(&checkpoint.state)?;
        let position = serde_json::to_string(&checkpoint.position)
            .map_err(|e| CheckpointError::Serialization(e.to_string()))?;
        let subgraph_states = serde_json::to_string(&checkpoint.subgraph_states)
            .map_err(|e| CheckpointError::Serialization(e.to_string()))?;
        let pending = checkpoint
            .pending_interrupt
            .as_ref()
            .map(|p| self.interrupt_serializer.serialize(p))
            .transpose()?;
        let source = checkpoint.metadata.source.as_str();
        let step = checkpoint.metadata.step as i64;
        let created_at = created_at_to_i64(&checkpoint.metadata.created_at);
        let id = checkpoint.id.clone();
        let ts = checkpoint.ts.clone();

        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&db_path).map_err(storage)?;
            conn.execute(
                r#"
                INSERT OR REPLACE INTO checkpoints
                (thread_id, checkpoint_id, ts, state, position, subgraph_states,
                 pending_interrupt, metadata_source, metadata_step, metadata_created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
                params![
                    thread_id,
                    id.clone(),
                    ts,
                    state,
                    position,
                    subgraph_states,
                    pending,
                    source,
                    step,
                    created_at,
                ],
            )
            .map_err(storage)?;
            Ok::<String, CheckpointError>(id)
        })
        .await
        .map_err(storage)?
    }

    async fn get_tuple(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<Checkpoint>, CheckpointError> {
        let thread_id = thread_id_required(config)?.to_string();
        let db_path = self.db_path.clone();

        let row = tokio::task::spawn_blocking(move || -> Result<Option<RowData>, CheckpointError> {
            let conn = rusqlite::Connection::open(&db_path).map_err(storage)?;
            conn.query_row(
                "SELECT checkpoint_id, ts, state, position, subgraph_states, pending_interrupt,
                        metadata_source, metadata_step, metadata_created_at
                 FROM checkpoints WHERE thread_id = ?1",
                params![thread_id],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                        row.get(6)?,
                        row.get(7)?,
                        row.get(8)?,
                    ))
                },
            )
            .optional()
            .map_err(storage)
        })
        .await
        .map_err(storage)??;

        let (id, ts, state, position, subgraph_states, pending, source, step, created_at) = match row {
            Some(r) => r,
            None => return Ok(None),
        };

        let state = self.state_serializer.deserialize(&state)?;
        let position: Vec<String> = serde_json::from_str(&position)
            .map_err(|e| CheckpointError::Serialization(e.to_string()))?;
        let subgraph_states: Vec<StateRecord> = serde_json::from_str(&subgraph_states)
            .map_err(|e| CheckpointError::Serialization(e.to_string()))?;
        let pending_interrupt = pending
            .map(|bytes| self.interrupt_serializer.deserialize(&bytes))
            .transpose()?;
        let source = CheckpointSource::parse(&source).ok_or_else(|| {
            CheckpointError::Serialization(format!("unknown checkpoint source: {}", source))
        })?;
        Ok(Some(Checkpoint {
            id,
            ts,
            state,
            position,
            subgraph_states,
            pending_interrupt,
            metadata: CheckpointMetadata {
                source,
                step: step as u64,
                created_at: i64_to_created_at(created_at),
            },
        }))
    }

    async fn delete_thread(&self, config: &RunnableConfig) -> Result<(), CheckpointError> {
        let thread_id = thread_id_required(config)?.to_string();
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&db_path).map_err(storage)?;
            conn.execute(
                "DELETE FROM checkpoints WHERE thread_id = ?1",
                params![thread_id],
            )
            .map_err(storage)?;
            Ok::<(), CheckpointError>(())
        })
        .await
        .map_err(storage)?
    }
}
