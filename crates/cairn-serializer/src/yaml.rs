use serde_json::Value;

use crate::{Serializer, SerializerError};

/// A single YAML document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct YamlSerializer;

impl Serializer for YamlSerializer {
  fn name(&self) -> &'static str {
    "yaml"
  }

  fn serialize(&self, value: &Value) -> Result<Vec<u8>, SerializerError> {
    Ok(serde_yaml::to_string(value)?.into_bytes())
  }

  fn deserialize(&self, bytes: &[u8]) -> Result<Value, SerializerError> {
    Ok(serde_yaml::from_slice(bytes)?)
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn test_round_trip() {
    let value = json!({ "name": "extract", "rows": [1, 2], "ratio": 0.5 });
    let bytes = YamlSerializer.serialize(&value).unwrap();
    assert_eq!(YamlSerializer.deserialize(&bytes).unwrap(), value);
  }

  #[test]
  fn test_reads_hand_written_yaml() {
    let value = YamlSerializer.deserialize(b"a: 1\nb: [x, y]\n").unwrap();
    assert_eq!(value, json!({ "a": 1, "b": ["x", "y"] }));
  }
}
