//! Checkpoint errors.

use cairn_result::ResultError;
use cairn_store::StoreError;

/// Errors that can occur while checkpointing a task's output.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
  /// Formatting, writing or reading the result failed.
  #[error("result for task '{task}' failed: {source}")]
  Result {
    task: String,
    #[source]
    source: ResultError,
  },

  /// The tracking store rejected the record.
  #[error("failed to track task '{task}': {source}")]
  Store {
    task: String,
    #[source]
    source: StoreError,
  },
}
