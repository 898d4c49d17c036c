//! Cairn Checkpoint
//!
//! Decides whether and where a task's output is persisted.
//!
//! # Which result applies
//!
//! ```text
//! task.result ──(unset)──▶ flow.result ──(unset)──▶ local result in Settings::results_dir
//! ```
//!
//! # Whether it is persisted
//!
//! Only when all of these hold:
//! - checkpointing is on (`CAIRN__FLOWS__CHECKPOINTING=true` or `--checkpointing`)
//! - the task does not set `checkpoint: false`
//! - the task computed something (not NoResult)
//! - the selected result accepts writes (not `constant` / `none`)
//!
//! Persisted outputs are recorded in the tracking store when one is attached.
//! The record holds the location, never the value.

mod checkpointer;
mod error;
mod select;

pub use checkpointer::{CheckpointOutcome, Checkpointer, SkipReason};
pub use error::CheckpointError;
pub use select::{ResultSelection, ResultSource, select_result};
