use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::{Serializer, SerializerError};

/// Timestamps stored as RFC 3339 text, normalised to UTC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateTimeSerializer;

impl DateTimeSerializer {
  fn parse(&self, text: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(text.trim())
      .map(|dt| dt.with_timezone(&Utc))
      .map_err(|e| format!("'{}' is not an RFC 3339 timestamp: {}", text, e))
  }
}

impl Serializer for DateTimeSerializer {
  fn name(&self) -> &'static str {
    "date_time"
  }

  fn serialize(&self, value: &Value) -> Result<Vec<u8>, SerializerError> {
    let text = value
      .as_str()
      .ok_or_else(|| SerializerError::UnsupportedValue {
        serializer: self.name(),
        message: format!("expected a timestamp string, got {}", value),
      })?;
    let dt = self
      .parse(text)
      .map_err(|message| SerializerError::UnsupportedValue {
        serializer: self.name(),
        message,
      })?;
    Ok(
      dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
        .into_bytes(),
    )
  }

  fn deserialize(&self, bytes: &[u8]) -> Result<Value, SerializerError> {
    let invalid = |message: String| SerializerError::InvalidBytes {
      serializer: "date_time",
      message,
    };
    let text = std::str::from_utf8(bytes).map_err(|e| invalid(e.to_string()))?;
    let dt = self.parse(text).map_err(invalid)?;
    Ok(Value::String(
      dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
    ))
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn test_normalises_to_utc() {
    let bytes = DateTimeSerializer
      .serialize(&json!("2024-03-01T12:30:00+02:00"))
      .unwrap();
    assert_eq!(bytes, b"2024-03-01T10:30:00Z");
    assert_eq!(
      DateTimeSerializer.deserialize(&bytes).unwrap(),
      json!("2024-03-01T10:30:00Z")
    );
  }

  #[test]
  fn test_keeps_subseconds() {
    let bytes = DateTimeSerializer
      .serialize(&json!("2024-03-01T10:30:00.250Z"))
      .unwrap();
    assert_eq!(bytes, b"2024-03-01T10:30:00.250Z");
  }

  #[test]
  fn test_rejects_non_timestamps() {
    assert!(matches!(
      DateTimeSerializer.serialize(&json!("yesterday")),
      Err(SerializerError::UnsupportedValue { .. })
    ));
    assert!(matches!(
      DateTimeSerializer.serialize(&json!(1700000000)),
      Err(SerializerError::UnsupportedValue { .. })
    ));
    assert!(matches!(
      DateTimeSerializer.deserialize(b"not a date"),
      Err(SerializerError::InvalidBytes { .. })
    ));
  }
}
