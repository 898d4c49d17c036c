use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// How a task run obtained its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum RunState {
  /// The output was computed and written.
  Success,
  /// The output was read back from an existing target.
  Cached,
}

/// A checkpointed task run as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TaskRunRecord {
  pub task_run_id: String,
  pub flow_run_id: String,
  pub flow_name: String,
  pub task_name: String,
  pub state: RunState,
  pub result_kind: String,
  pub location: String,
  pub serializer: String,
  pub recorded_at: DateTime<Utc>,
}
