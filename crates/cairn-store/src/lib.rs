//! Cairn Store
//!
//! This crate provides the tracking store for checkpointed task runs.
//!
//! A [`TaskRunRecord`] says *where* a task's output was persisted: the result
//! kind, the location and the serializer. It deliberately has no value column.
//! Reading the value back goes through the result that wrote it.

mod sqlite;
mod types;

pub use sqlite::SqliteStore;
pub use types::{RunState, TaskRunRecord};

use async_trait::async_trait;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  /// The requested record was not found.
  #[error("not found: {0}")]
  NotFound(String),

  /// A database error occurred.
  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),
}

/// Storage trait for task run records.
#[async_trait]
pub trait TrackingStore: Send + Sync {
  /// Insert a record, replacing any record with the same task run ID.
  async fn record(&self, record: &TaskRunRecord) -> Result<(), StoreError>;

  /// Get a record by task run ID.
  async fn get(&self, task_run_id: &str) -> Result<TaskRunRecord, StoreError>;

  /// List records for a task name, oldest first.
  async fn list_for_task(&self, task_name: &str) -> Result<Vec<TaskRunRecord>, StoreError>;

  /// List records for a flow run, oldest first.
  async fn list_for_flow_run(&self, flow_run_id: &str) -> Result<Vec<TaskRunRecord>, StoreError>;
}
