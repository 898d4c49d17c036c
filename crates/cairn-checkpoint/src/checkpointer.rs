use std::sync::Arc;

use cairn_config::{FlowDef, Settings, TaskDef};
use cairn_result::{
  LocationContext, ResultError, ResultFactory, ResultValue, Storage, TaskResult, render_location,
};
use cairn_store::{RunState, TaskRunRecord, TrackingStore};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::error::CheckpointError;
use crate::select::{ResultSource, select_result};

/// Why an output was not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
  /// Global checkpointing is off.
  CheckpointingDisabled,
  /// The task sets `checkpoint: false`.
  TaskOptedOut,
  /// The task computed nothing, or its result is `none`.
  NoResult,
  /// The selected result is a constant.
  ReadOnly,
}

/// What happened to a task's output.
#[derive(Debug, Clone)]
pub enum CheckpointOutcome {
  /// Written to storage.
  Persisted {
    result: TaskResult,
    source: ResultSource,
  },
  /// Read back from an existing target.
  Cached { result: TaskResult },
  /// Kept in memory only.
  Skipped {
    result: TaskResult,
    reason: SkipReason,
  },
}

impl CheckpointOutcome {
  pub fn result(&self) -> &TaskResult {
    match self {
      CheckpointOutcome::Persisted { result, .. }
      | CheckpointOutcome::Cached { result }
      | CheckpointOutcome::Skipped { result, .. } => result,
    }
  }

  pub fn into_result(self) -> TaskResult {
    match self {
      CheckpointOutcome::Persisted { result, .. }
      | CheckpointOutcome::Cached { result }
      | CheckpointOutcome::Skipped { result, .. } => result,
    }
  }

  pub fn is_persisted(&self) -> bool {
    matches!(self, CheckpointOutcome::Persisted { .. })
  }
}

/// Persists task outputs according to flow and task configuration.
pub struct Checkpointer {
  factory: ResultFactory,
  store: Option<Arc<dyn TrackingStore>>,
}

impl Checkpointer {
  pub fn new(settings: Settings) -> Self {
    Self {
      factory: ResultFactory::new(settings),
      store: None,
    }
  }

  /// Record persisted and cached outputs in `store`.
  pub fn with_store(mut self, store: Arc<dyn TrackingStore>) -> Self {
    self.store = Some(store);
    self
  }

  pub fn settings(&self) -> &Settings {
    self.factory.settings()
  }

  pub fn factory(&self) -> &ResultFactory {
    &self.factory
  }

  /// The result a task's output goes to, and which level configured it.
  pub fn result_for(&self, flow: &FlowDef, task: &TaskDef) -> (TaskResult, ResultSource) {
    let selection = select_result(flow, task);
    let result = match selection.config {
      Some(config) => self.factory.build(config),
      None => self.factory.default_result(),
    };
    (result, selection.source)
  }

  /// Persist `value` as the output of `task`, if checkpointing applies.
  #[instrument(
    name = "checkpoint",
    skip(self, flow, task, value, ctx),
    fields(flow = %flow.name, task = %task.name)
  )]
  pub async fn checkpoint(
    &self,
    flow: &FlowDef,
    task: &TaskDef,
    value: impl Into<ResultValue>,
    ctx: &LocationContext,
  ) -> Result<CheckpointOutcome, CheckpointError> {
    let value = value.into();
    let ctx = task_context(flow, task, ctx);
    let (result, source) = self.result_for(flow, task);

    let skip = if !self.settings().checkpointing {
      Some(SkipReason::CheckpointingDisabled)
    } else if !task.checkpoint_enabled() {
      Some(SkipReason::TaskOptedOut)
    } else if value.is_no_result() || result.is_no_result() {
      Some(SkipReason::NoResult)
    } else if matches!(result.storage(), Storage::Constant) {
      Some(SkipReason::ReadOnly)
    } else {
      None
    };

    if let Some(reason) = skip {
      info!(reason = ?reason, "checkpoint_skipped");
      return Ok(CheckpointOutcome::Skipped {
        result: result.from_value(value),
        reason,
      });
    }

    let target = match &task.target {
      Some(_) if !matches!(result.storage(), Storage::Backend(_)) => {
        warn!(kind = result.kind(), "targets need a backend result; ignoring target");
        None
      }
      target => target.as_ref(),
    };

    let written = match target {
      Some(target) => {
        let location = render_location(target, &ctx).map_err(|e| result_error(task, e))?;
        result.write_at(value, location).await
      }
      None => result.write(value, &ctx).await,
    }
    .map_err(|e| result_error(task, e))?;

    info!(
      source = ?source,
      kind = written.kind(),
      location = written.location().unwrap_or_default(),
      "task_checkpointed"
    );

    self
      .track(flow, task, &ctx, &written, RunState::Success)
      .await?;

    Ok(CheckpointOutcome::Persisted {
      result: written,
      source,
    })
  }

  /// Read a task's output back from its target, if the target exists.
  ///
  /// A hit is returned as [`CheckpointOutcome::Cached`]. Returns `None` when the task has no target, when nothing exists at the
  /// formatted target, or when its result is not stored in a backend.
  #[instrument(
    name = "cached",
    skip(self, flow, task, ctx),
    fields(flow = %flow.name, task = %task.name)
  )]
  pub async fn cached(
    &self,
    flow: &FlowDef,
    task: &TaskDef,
    ctx: &LocationContext,
  ) -> Result<Option<CheckpointOutcome>, CheckpointError> {
    let Some(target) = &task.target else {
      return Ok(None);
    };

    let ctx = task_context(flow, task, ctx);
    let (result, _) = self.result_for(flow, task);
    if !matches!(result.storage(), Storage::Backend(_)) {
      warn!(kind = result.kind(), "targets need a backend result; ignoring target");
      return Ok(None);
    }

    if !result
      .exists(target, &ctx)
      .await
      .map_err(|e| result_error(task, e))?
    {
      return Ok(None);
    }

    let location = render_location(target, &ctx).map_err(|e| result_error(task, e))?;
    let read = result
      .read(&location)
      .await
      .map_err(|e| result_error(task, e))?;

    info!(location = %location, "target_hit");
    self
      .track(flow, task, &ctx, &read, RunState::Cached)
      .await?;

    Ok(Some(CheckpointOutcome::Cached { result: read }))
  }

  /// Checkpoint several task outputs concurrently.
  ///
  /// Results come back in the order of `outputs`.
  pub async fn checkpoint_all(
    &self,
    flow: &FlowDef,
    outputs: Vec<(&TaskDef, ResultValue, LocationContext)>,
  ) -> Vec<Result<CheckpointOutcome, CheckpointError>> {
    let futures = outputs
      .into_iter()
      .map(|(task, value, ctx)| async move { self.checkpoint(flow, task, value, &ctx).await });
    futures::future::join_all(futures).await
  }

  async fn track(
    &self,
    flow: &FlowDef,
    task: &TaskDef,
    ctx: &LocationContext,
    result: &TaskResult,
    state: RunState,
  ) -> Result<(), CheckpointError> {
    let (Some(store), Some(record)) = (&self.store, result.record()) else {
      return Ok(());
    };

    let run = TaskRunRecord {
      task_run_id: ctx
        .task_run_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
      flow_run_id: ctx.flow_run_id.clone().unwrap_or_default(),
      flow_name: flow.name.clone(),
      task_name: task.name.clone(),
      state,
      result_kind: record.kind,
      location: record.location,
      serializer: record.serializer,
      recorded_at: Utc::now(),
    };

    store
      .record(&run)
      .await
      .map_err(|source| CheckpointError::Store {
        task: task.name.clone(),
        source,
      })
  }
}

/// Fill in the flow and task fields the caller left unset.
fn task_context(flow: &FlowDef, task: &TaskDef, ctx: &LocationContext) -> LocationContext {
  let mut ctx = ctx.clone();
  ctx.flow_name.get_or_insert_with(|| flow.name.clone());
  ctx.task_name.get_or_insert_with(|| task.name.clone());
  ctx.task_slug.get_or_insert_with(|| task.slug().to_string());
  if ctx.task_full_name.is_none() {
    ctx.task_full_name = Some(match ctx.map_index {
      Some(index) => format!("{}[{}]", task.name, index),
      None => task.name.clone(),
    });
  }
  ctx
    .task_run_id
    .get_or_insert_with(|| uuid::Uuid::new_v4().to_string());
  ctx
}

fn result_error(task: &TaskDef, source: ResultError) -> CheckpointError {
  CheckpointError::Result {
    task: task.name.clone(),
    source,
  }
}

#[cfg(test)]
mod tests {
  use cairn_config::ResultConfig;
  use cairn_store::SqliteStore;
  use serde_json::json;

  use super::*;

  fn memory(location: &str) -> ResultConfig {
    ResultConfig::Memory {
      location: Some(location.to_string()),
      serializer: None,
    }
  }

  fn flow() -> FlowDef {
    let mut flow = FlowDef::new("etl");
    flow.result = Some(memory("{{ flow_name }}/{{ task_name }}.json"));
    flow
  }

  fn ctx() -> LocationContext {
    LocationContext::new().with_flow("etl", "run-1")
  }

  fn enabled() -> Checkpointer {
    Checkpointer::new(Settings::new("/srv/cairn").with_checkpointing(true))
  }

  #[tokio::test]
  async fn test_disabled_globally() {
    let checkpointer = Checkpointer::new(Settings::new("/srv/cairn"));
    let outcome = checkpointer
      .checkpoint(&flow(), &TaskDef::new("extract"), json!(1), &ctx())
      .await
      .unwrap();

    match outcome {
      CheckpointOutcome::Skipped { result, reason } => {
        assert_eq!(reason, SkipReason::CheckpointingDisabled);
        assert_eq!(result.value().as_value(), Some(&json!(1)));
        assert!(result.location().is_none());
      }
      other => panic!("expected skip, got {:?}", other),
    }
    assert!(checkpointer.factory().memory_backend().is_empty());
  }

  #[tokio::test]
  async fn test_task_opt_out() {
    let mut task = TaskDef::new("extract");
    task.checkpoint = Some(false);
    let outcome = enabled()
      .checkpoint(&flow(), &task, json!(1), &ctx())
      .await
      .unwrap();
    assert!(matches!(
      outcome,
      CheckpointOutcome::Skipped {
        reason: SkipReason::TaskOptedOut,
        ..
      }
    ));
  }

  #[tokio::test]
  async fn test_no_result_not_persisted() {
    let outcome = enabled()
      .checkpoint(&flow(), &TaskDef::new("extract"), ResultValue::NoResult, &ctx())
      .await
      .unwrap();
    assert!(matches!(
      outcome,
      CheckpointOutcome::Skipped {
        reason: SkipReason::NoResult,
        ..
      }
    ));

    let mut task = TaskDef::new("extract");
    task.result = Some(ResultConfig::None);
    let outcome = enabled()
      .checkpoint(&flow(), &task, json!(1), &ctx())
      .await
      .unwrap();
    assert!(matches!(
      outcome,
      CheckpointOutcome::Skipped {
        reason: SkipReason::NoResult,
        ..
      }
    ));
  }

  #[tokio::test]
  async fn test_constant_not_persisted() {
    let mut task = TaskDef::new("extract");
    task.result = Some(ResultConfig::Constant { value: json!(0) });
    let outcome = enabled()
      .checkpoint(&flow(), &task, json!(1), &ctx())
      .await
      .unwrap();
    assert!(matches!(
      outcome,
      CheckpointOutcome::Skipped {
        reason: SkipReason::ReadOnly,
        ..
      }
    ));
  }

  #[tokio::test]
  async fn test_flow_result_persisted() {
    let checkpointer = enabled();
    let outcome = checkpointer
      .checkpoint(&flow(), &TaskDef::new("extract"), json!({ "n": 1 }), &ctx())
      .await
      .unwrap();

    match &outcome {
      CheckpointOutcome::Persisted { result, source } => {
        assert_eq!(*source, ResultSource::Flow);
        assert_eq!(result.location(), Some("etl/extract.json"));
      }
      other => panic!("expected persisted, got {:?}", other),
    }
    assert_eq!(
      checkpointer.factory().memory_backend().locations(),
      vec!["etl/extract.json".to_string()]
    );
  }

  #[tokio::test]
  async fn test_task_result_overrides_flow() {
    let checkpointer = enabled();
    let mut task = TaskDef::new("extract");
    task.result = Some(memory("own/{{ task_slug }}.json"));
    task.slug = Some("extract-v2".to_string());

    let outcome = checkpointer
      .checkpoint(&flow(), &task, json!(1), &ctx())
      .await
      .unwrap();

    assert!(outcome.is_persisted());
    assert_eq!(outcome.result().location(), Some("own/extract-v2.json"));
  }

  #[tokio::test]
  async fn test_target_is_written_and_then_cached() {
    let store = Arc::new(SqliteStore::in_memory().await.unwrap());
    store.migrate().await.unwrap();
    let checkpointer = enabled().with_store(store.clone());

    let mut task = TaskDef::new("extract");
    task.target = Some("targets/{{ task_name }}.json".to_string());

    assert!(
      checkpointer
        .cached(&flow(), &task, &ctx())
        .await
        .unwrap()
        .is_none()
    );

    let first = ctx().with_task("extract", "task-run-1");
    let outcome = checkpointer
      .checkpoint(&flow(), &task, json!([1, 2]), &first)
      .await
      .unwrap();
    assert_eq!(outcome.result().location(), Some("targets/extract.json"));

    let second = ctx().with_task("extract", "task-run-2");
    let cached = checkpointer
      .cached(&flow(), &task, &second)
      .await
      .unwrap()
      .unwrap();
    assert!(matches!(cached, CheckpointOutcome::Cached { .. }));
    assert!(!cached.is_persisted());
    assert_eq!(cached.result().value().as_value(), Some(&json!([1, 2])));

    let runs = store.list_for_task("extract").await.unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].task_run_id, "task-run-1");
    assert_eq!(runs[0].state, RunState::Success);
    assert_eq!(runs[1].task_run_id, "task-run-2");
    assert_eq!(runs[1].state, RunState::Cached);
    assert!(runs.iter().all(|r| r.location == "targets/extract.json"));
  }

  #[tokio::test]
  async fn test_tracking_record_has_no_value() {
    let store = Arc::new(SqliteStore::in_memory().await.unwrap());
    store.migrate().await.unwrap();
    let checkpointer = enabled().with_store(store.clone());

    checkpointer
      .checkpoint(
        &flow(),
        &TaskDef::new("extract"),
        json!({ "password": "hunter2" }),
        &ctx().with_task("extract", "t1"),
      )
      .await
      .unwrap();

    let record = store.get("t1").await.unwrap();
    assert_eq!(record.flow_run_id, "run-1");
    assert_eq!(record.result_kind, "memory");
    assert_eq!(record.serializer, "json");
    assert_eq!(record.location, "etl/extract.json");
    assert!(!serde_json::to_string(&record).unwrap().contains("hunter2"));
  }

  #[tokio::test]
  async fn test_inline_record_carries_value_in_location() {
    let store = Arc::new(SqliteStore::in_memory().await.unwrap());
    store.migrate().await.unwrap();
    let checkpointer = enabled().with_store(store.clone());
    let mut task = TaskDef::new("count");
    task.result = Some(ResultConfig::Inline);

    checkpointer
      .checkpoint(&flow(), &task, json!(42), &ctx().with_task("count", "t1"))
      .await
      .unwrap();

    let record = store.get("t1").await.unwrap();
    assert_eq!(record.result_kind, "inline");
    assert_eq!(record.location, "42");
  }

  #[tokio::test]
  async fn test_inline_result_ignores_target() {
    let mut task = TaskDef::new("count");
    task.result = Some(ResultConfig::Inline);
    task.target = Some("{{ map_index }}.json".to_string());

    let outcome = enabled()
      .checkpoint(&flow(), &task, json!([1, 2]), &ctx())
      .await
      .unwrap();
    assert!(outcome.is_persisted());
    assert_eq!(outcome.result().location(), Some("[1,2]"));
  }

  #[tokio::test]
  async fn test_template_error_names_task() {
    let mut task = TaskDef::new("extract");
    task.result = Some(memory("{{ map_index }}.json"));
    let err = enabled()
      .checkpoint(&flow(), &task, json!(1), &ctx())
      .await
      .unwrap_err();
    assert!(matches!(err, CheckpointError::Result { ref task, .. } if task == "extract"));
  }

  #[tokio::test]
  async fn test_checkpoint_all() {
    let checkpointer = enabled();
    let flow = flow();
    let extract = TaskDef::new("extract");
    let load = TaskDef::new("load");

    let outcomes = checkpointer
      .checkpoint_all(
        &flow,
        vec![
          (&extract, ResultValue::from(json!(1)), ctx()),
          (&load, ResultValue::NoResult, ctx()),
        ],
      )
      .await;

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].as_ref().unwrap().is_persisted());
    assert!(!outcomes[1].as_ref().unwrap().is_persisted());
    assert_eq!(checkpointer.factory().memory_backend().len(), 1);
  }
}
