use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::serializer::SerializerConfig;

/// The result a task's output is stored in.
///
/// `location` fields are templates rendered against the location context at
/// write time, e.g. `"{{ task_name }}/{{ today }}.json"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResultConfig {
  /// Files on the local filesystem.
  Local {
    /// Base directory. Defaults to the configured results directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    serializer: Option<SerializerConfig>,
  },

  /// An in-process store, lost when the process exits.
  Memory {
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    serializer: Option<SerializerConfig>,
  },

  /// The value is JSON-encoded into the location itself.
  ///
  /// Whatever the task returns ends up in every tracking record, so only use
  /// this for small, non-sensitive values.
  Inline,

  /// A fixed value that is never written.
  Constant { value: serde_json::Value },

  /// Explicitly no result.
  None,
}

impl ResultConfig {
  /// Short type name, matching the serialized `type` tag.
  pub fn kind(&self) -> &'static str {
    match self {
      ResultConfig::Local { .. } => "local",
      ResultConfig::Memory { .. } => "memory",
      ResultConfig::Inline => "inline",
      ResultConfig::Constant { .. } => "constant",
      ResultConfig::None => "none",
    }
  }
}
