//! Cairn Tasks
//!
//! Built-in tasks that operate on the local filesystem, typically on the
//! files local results were written to.
//!
//! Every task is configured at construction and can be overridden per run:
//!
//! ```ignore
//! let task = Move::new("results/etl/extract.json", "archive/");
//! let moved_to = task.run(None, None).await?;       // archive/extract.json
//! let other = task.run(Some(Path::new("b.json")), None).await?;
//! ```

mod error;
mod files;

pub use error::FileTaskError;
pub use files::{Copy, Move, Remove};
