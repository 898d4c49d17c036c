//! Cairn Config
//!
//! This crate contains the serializable configuration types for cairn. They
//! describe *which* result and serializer a task should use before anything is
//! built at runtime.
//!
//! Configuration can be loaded from:
//! - JSON or YAML flow files (via CLI with `cairn checkpoint flow.yaml`)
//! - Environment variables (see [`Settings`])
//!
//! A result configuration is the construction keyword for a task:
//!
//! ```json
//! {
//!   "name": "fetch",
//!   "result": {
//!     "type": "local",
//!     "dir": "/tmp/results",
//!     "location": "{{ flow_name }}/{{ task_name }}/{{ today }}.json",
//!     "serializer": { "type": "json", "pretty": true }
//!   }
//! }
//! ```

mod error;
mod file;
mod flow;
mod result;
mod serializer;
mod settings;

pub use error::ConfigError;
pub use file::load_file;
pub use flow::{FlowDef, TaskDef};
pub use result::ResultConfig;
pub use serializer::SerializerConfig;
pub use settings::{CHECKPOINTING_ENV, HOME_ENV, Settings, parse_bool};
