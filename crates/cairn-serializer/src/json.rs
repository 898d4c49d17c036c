use serde_json::Value;

use crate::{Serializer, SerializerError};

/// UTF-8 JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonSerializer {
  pub pretty: bool,
}

impl Serializer for JsonSerializer {
  fn name(&self) -> &'static str {
    "json"
  }

  fn serialize(&self, value: &Value) -> Result<Vec<u8>, SerializerError> {
    let bytes = if self.pretty {
      serde_json::to_vec_pretty(value)?
    } else {
      serde_json::to_vec(value)?
    };
    Ok(bytes)
  }

  fn deserialize(&self, bytes: &[u8]) -> Result<Value, SerializerError> {
    Ok(serde_json::from_slice(bytes)?)
  }
}
