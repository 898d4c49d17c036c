use std::path::Path;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::{StoreError, TaskRunRecord, TrackingStore};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS task_runs (
  task_run_id TEXT PRIMARY KEY NOT NULL,
  flow_run_id TEXT NOT NULL,
  flow_name TEXT NOT NULL,
  task_name TEXT NOT NULL,
  state TEXT NOT NULL,
  result_kind TEXT NOT NULL,
  location TEXT NOT NULL,
  serializer TEXT NOT NULL,
  recorded_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS task_runs_task_name ON task_runs (task_name);
CREATE INDEX IF NOT EXISTS task_runs_flow_run_id ON task_runs (flow_run_id);
"#;

/// SQLite-based tracking store.
pub struct SqliteStore {
  pool: SqlitePool,
}

impl SqliteStore {
  /// Create a new SQLite store with the given connection pool.
  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }

  /// Open the database file at `path`, creating it if needed.
  pub async fn open(path: &Path) -> Result<Self, StoreError> {
    let options = SqliteConnectOptions::new()
      .filename(path)
      .create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await?;
    Ok(Self::new(pool))
  }

  /// A private in-memory database.
  ///
  /// Every SQLite in-memory connection is its own database, so the pool is
  /// pinned to a single connection that is never recycled.
  pub async fn in_memory() -> Result<Self, StoreError> {
    let pool = SqlitePoolOptions::new()
      .max_connections(1)
      .idle_timeout(None)
      .max_lifetime(None)
      .connect("sqlite::memory:")
      .await?;
    Ok(Self::new(pool))
  }

  /// Create the schema if it does not exist.
  pub async fn migrate(&self) -> Result<(), StoreError> {
    sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
    Ok(())
  }
}

#[async_trait]
impl TrackingStore for SqliteStore {
  async fn record(&self, record: &TaskRunRecord) -> Result<(), StoreError> {
    sqlx::query(
      r#"
            INSERT OR REPLACE INTO task_runs
              (task_run_id, flow_run_id, flow_name, task_name, state, result_kind, location, serializer, recorded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
    )
    .bind(&record.task_run_id)
    .bind(&record.flow_run_id)
    .bind(&record.flow_name)
    .bind(&record.task_name)
    .bind(record.state)
    .bind(&record.result_kind)
    .bind(&record.location)
    .bind(&record.serializer)
    .bind(record.recorded_at)
    .execute(&self.pool)
    .await?;

    Ok(())
  }

  async fn get(&self, task_run_id: &str) -> Result<TaskRunRecord, StoreError> {
    sqlx::query_as(
      r#"
            SELECT task_run_id, flow_run_id, flow_name, task_name, state, result_kind, location, serializer, recorded_at
            FROM task_runs
            WHERE task_run_id = ?
            "#,
    )
    .bind(task_run_id)
    .fetch_optional(&self.pool)
    .await?
    .ok_or_else(|| StoreError::NotFound(task_run_id.to_string()))
  }

  async fn list_for_task(&self, task_name: &str) -> Result<Vec<TaskRunRecord>, StoreError> {
    let records = sqlx::query_as(
      r#"
            SELECT task_run_id, flow_run_id, flow_name, task_name, state, result_kind, location, serializer, recorded_at
            FROM task_runs
            WHERE task_name = ?
            ORDER BY recorded_at ASC
            "#,
    )
    .bind(task_name)
    .fetch_all(&self.pool)
    .await?;

    Ok(records)
  }

  async fn list_for_flow_run(&self, flow_run_id: &str) -> Result<Vec<TaskRunRecord>, StoreError> {
    let records = sqlx::query_as(
      r#"
            SELECT task_run_id, flow_run_id, flow_name, task_name, state, result_kind, location, serializer, recorded_at
            FROM task_runs
            WHERE flow_run_id = ?
            ORDER BY recorded_at ASC
            "#,
    )
    .bind(flow_run_id)
    .fetch_all(&self.pool)
    .await?;

    Ok(records)
  }
}
