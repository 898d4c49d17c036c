use serde::{Deserialize, Serialize};

/// Which serializer a result uses to turn its value into bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SerializerConfig {
  Json {
    #[serde(default)]
    pretty: bool,
  },
  Yaml,
  DateTime,
  Text,
}

impl Default for SerializerConfig {
  fn default() -> Self {
    SerializerConfig::Json { pretty: false }
  }
}
