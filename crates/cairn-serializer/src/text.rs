use serde_json::Value;

use crate::{Serializer, SerializerError};

/// Stores a string value as its raw UTF-8 contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextSerializer;

impl Serializer for TextSerializer {
  fn name(&self) -> &'static str {
    "text"
  }

  fn serialize(&self, value: &Value) -> Result<Vec<u8>, SerializerError> {
    match value {
      Value::String(s) => Ok(s.clone().into_bytes()),
      other => Err(SerializerError::UnsupportedValue {
        serializer: self.name(),
        message: format!("expected a string, got {}", other),
      }),
    }
  }

  fn deserialize(&self, bytes: &[u8]) -> Result<Value, SerializerError> {
    let text = std::str::from_utf8(bytes).map_err(|e| SerializerError::InvalidBytes {
      serializer: self.name(),
      message: e.to_string(),
    })?;
    Ok(Value::String(text.to_string()))
  }
}
