//! Cairn Serializer
//!
//! A [`Serializer`] is a pure pair of transformations, value to bytes and
//! bytes to value, that a result uses to persist and recover its value.
//! Values are `serde_json::Value`, the dynamic data type task outputs are
//! carried in.
//!
//! Serializers are identified by [`Serializer::name`]. Two results with the
//! same serializer name can read each other's bytes.

mod datetime;
mod json;
mod text;
mod yaml;

use std::fmt;
use std::sync::Arc;

use cairn_config::SerializerConfig;
use serde_json::Value;

pub use datetime::DateTimeSerializer;
pub use json::JsonSerializer;
pub use text::TextSerializer;
pub use yaml::YamlSerializer;

/// Error type for serialization.
#[derive(Debug, thiserror::Error)]
pub enum SerializerError {
  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("yaml error: {0}")]
  Yaml(#[from] serde_yaml::Error),

  /// The serializer cannot represent this value.
  #[error("{serializer} serializer cannot handle value: {message}")]
  UnsupportedValue {
    serializer: &'static str,
    message: String,
  },

  /// The bytes are not something this serializer produced.
  #[error("{serializer} serializer cannot decode bytes: {message}")]
  InvalidBytes {
    serializer: &'static str,
    message: String,
  },
}

/// Turns result values into bytes and back.
pub trait Serializer: Send + Sync + fmt::Debug {
  /// Stable identifier recorded next to every persisted location.
  fn name(&self) -> &'static str;

  fn serialize(&self, value: &Value) -> Result<Vec<u8>, SerializerError>;

  fn deserialize(&self, bytes: &[u8]) -> Result<Value, SerializerError>;
}

/// Build a serializer from its configuration.
pub fn from_config(config: &SerializerConfig) -> Arc<dyn Serializer> {
  match config {
    SerializerConfig::Json { pretty } => Arc::new(JsonSerializer { pretty: *pretty }),
    SerializerConfig::Yaml => Arc::new(YamlSerializer),
    SerializerConfig::DateTime => Arc::new(DateTimeSerializer),
    SerializerConfig::Text => Arc::new(TextSerializer),
  }
}

/// The serializer results use when none is configured.
pub fn default_serializer() -> Arc<dyn Serializer> {
  Arc::new(JsonSerializer::default())
}

/// Whether two serializers produce interchangeable bytes.
pub fn same_serializer(a: &dyn Serializer, b: &dyn Serializer) -> bool {
  a.name() == b.name()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_from_config() {
    assert_eq!(from_config(&SerializerConfig::Yaml).name(), "yaml");
    assert_eq!(from_config(&SerializerConfig::DateTime).name(), "date_time");
    assert_eq!(from_config(&SerializerConfig::Text).name(), "text");
    assert_eq!(
      from_config(&SerializerConfig::Json { pretty: true }).name(),
      "json"
    );
  }

  #[test]
  fn test_pretty_and_compact_json_are_interchangeable() {
    let pretty = JsonSerializer { pretty: true };
    let compact = JsonSerializer::default();
    assert!(same_serializer(&pretty, &compact));
    assert!(!same_serializer(&compact, &YamlSerializer));
  }
}
