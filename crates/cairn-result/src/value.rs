use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The value held by a result.
///
/// `NoResult` means no computation happened. It is not the same as a task
/// that computed `null`, which is `Value(Value::Null)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum ResultValue {
  #[default]
  NoResult,
  Value(Value),
}

impl ResultValue {
  pub fn is_no_result(&self) -> bool {
    matches!(self, ResultValue::NoResult)
  }

  pub fn as_value(&self) -> Option<&Value> {
    match self {
      ResultValue::Value(v) => Some(v),
      ResultValue::NoResult => None,
    }
  }

  pub fn into_value(self) -> Option<Value> {
    match self {
      ResultValue::Value(v) => Some(v),
      ResultValue::NoResult => None,
    }
  }
}

impl From<Value> for ResultValue {
  fn from(value: Value) -> Self {
    ResultValue::Value(value)
  }
}

impl From<Option<Value>> for ResultValue {
  fn from(value: Option<Value>) -> Self {
    value.map_or(ResultValue::NoResult, ResultValue::Value)
  }
}
