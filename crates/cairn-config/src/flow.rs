use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::file::load_file;
use crate::result::ResultConfig;

/// A task whose output may be checkpointed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDef {
  pub name: String,

  /// Defaults to the task name.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub slug: Option<String>,

  /// Task-level result. Takes precedence over the flow's result.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub result: Option<ResultConfig>,

  /// Set to `false` to never persist this task's output.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub checkpoint: Option<bool>,

  /// Location template. When a result already exists there the task's
  /// output is read back instead of recomputed.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub target: Option<String>,
}

impl TaskDef {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      slug: None,
      result: None,
      checkpoint: None,
      target: None,
    }
  }

  pub fn slug(&self) -> &str {
    self.slug.as_deref().unwrap_or(&self.name)
  }

  pub fn checkpoint_enabled(&self) -> bool {
    self.checkpoint.unwrap_or(true)
  }
}

/// A flow definition: a name, an optional flow-wide result and its tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowDef {
  pub name: String,

  /// Flow-level result, used by tasks that do not set their own.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub result: Option<ResultConfig>,

  #[serde(default)]
  pub tasks: Vec<TaskDef>,
}

impl FlowDef {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      result: None,
      tasks: Vec::new(),
    }
  }

  /// Parse a flow definition from a JSON or YAML file.
  pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
    load_file(path)
  }

  pub fn task(&self, name: &str) -> Result<&TaskDef, ConfigError> {
    self
      .tasks
      .iter()
      .find(|t| t.name == name)
      .ok_or_else(|| ConfigError::TaskNotFound {
        flow: self.name.clone(),
        task: name.to_string(),
      })
  }
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use super::*;
  use crate::SerializerConfig;

  #[test]
  fn test_task_defaults() {
    let task: TaskDef = serde_json::from_str(r#"{ "name": "fetch" }"#).unwrap();
    assert_eq!(task.slug(), "fetch");
    assert!(task.checkpoint_enabled());
    assert!(task.result.is_none());
  }

  #[test]
  fn test_task_serializes_only_set_fields() {
    let mut task = TaskDef::new("fetch");
    task.target = Some("{{ task_name }}.json".to_string());
    assert_eq!(
      serde_json::to_value(&task).unwrap(),
      serde_json::json!({ "name": "fetch", "target": "{{ task_name }}.json" })
    );
  }

  #[test]
  fn test_checkpoint_can_be_disabled() {
    let task: TaskDef =
      serde_json::from_str(r#"{ "name": "fetch", "checkpoint": false }"#).unwrap();
    assert!(!task.checkpoint_enabled());
  }

  #[test]
  fn test_load_yaml_flow() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    write!(
      file,
      r#"
name: etl
result:
  type: local
  dir: /tmp/etl
tasks:
  - name: extract
  - name: load
    result:
      type: memory
      serializer:
        type: yaml
"#
    )
    .unwrap();

    let flow = FlowDef::from_file(file.path()).unwrap();
    assert_eq!(flow.name, "etl");
    assert_eq!(flow.tasks.len(), 2);
    assert_eq!(
      flow.task("load").unwrap().result,
      Some(ResultConfig::Memory {
        location: None,
        serializer: Some(SerializerConfig::Yaml),
      })
    );
  }

  #[test]
  fn test_load_json_flow() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(
      file,
      r#"{{ "name": "etl", "tasks": [{{ "name": "extract", "target": "{{{{ today }}}}" }}] }}"#
    )
    .unwrap();

    let flow = FlowDef::from_file(file.path()).unwrap();
    assert_eq!(
      flow.task("extract").unwrap().target.as_deref(),
      Some("{{ today }}")
    );
  }

  #[test]
  fn test_missing_task() {
    let flow = FlowDef::new("etl");
    assert!(matches!(
      flow.task("nope"),
      Err(ConfigError::TaskNotFound { .. })
    ));
  }
}
