use cairn_config::{FlowDef, ResultConfig, TaskDef};
use serde::Serialize;

/// Which level of configuration provided a task's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
  Task,
  Flow,
  Default,
}

/// The result configuration that applies to a task, and where it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultSelection<'a> {
  pub source: ResultSource,
  /// `None` for [`ResultSource::Default`].
  pub config: Option<&'a ResultConfig>,
}

/// Apply the precedence rule: task result, then flow result, then default.
pub fn select_result<'a>(flow: &'a FlowDef, task: &'a TaskDef) -> ResultSelection<'a> {
  if let Some(config) = &task.result {
    return ResultSelection {
      source: ResultSource::Task,
      config: Some(config),
    };
  }
  if let Some(config) = &flow.result {
    return ResultSelection {
      source: ResultSource::Flow,
      config: Some(config),
    };
  }
  ResultSelection {
    source: ResultSource::Default,
    config: None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn memory(location: &str) -> ResultConfig {
    ResultConfig::Memory {
      location: Some(location.to_string()),
      serializer: None,
    }
  }

  #[test]
  fn test_task_result_wins() {
    let mut flow = FlowDef::new("etl");
    flow.result = Some(memory("flow.json"));
    let mut task = TaskDef::new("extract");
    task.result = Some(memory("task.json"));

    let selection = select_result(&flow, &task);
    assert_eq!(selection.source, ResultSource::Task);
    assert_eq!(selection.config, Some(&memory("task.json")));
  }

  #[test]
  fn test_flow_result_is_inherited() {
    let mut flow = FlowDef::new("etl");
    flow.result = Some(memory("flow.json"));
    let task = TaskDef::new("extract");

    let selection = select_result(&flow, &task);
    assert_eq!(selection.source, ResultSource::Flow);
    assert_eq!(selection.config, Some(&memory("flow.json")));
  }

  #[test]
  fn test_default_when_nothing_configured() {
    let flow = FlowDef::new("etl");
    let task = TaskDef::new("extract");

    let selection = select_result(&flow, &task);
    assert_eq!(selection.source, ResultSource::Default);
    assert!(selection.config.is_none());
  }

  #[test]
  fn test_explicit_none_on_task_still_wins() {
    let mut flow = FlowDef::new("etl");
    flow.result = Some(memory("flow.json"));
    let mut task = TaskDef::new("extract");
    task.result = Some(ResultConfig::None);

    let selection = select_result(&flow, &task);
    assert_eq!(selection.source, ResultSource::Task);
    assert_eq!(selection.config, Some(&ResultConfig::None));
  }
}
