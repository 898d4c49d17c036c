//! Location templates.
//!
//! A location template is a minijinja template rendered against a
//! [`LocationContext`] when a result is formatted:
//!
//! ```text
//! {{ flow_name }}/{{ task_name }}/{{ today }}.json
//! {{ task_slug }}-{{ map_index }}.yaml
//! archive/{{ date | strftime("%Y/%m") }}/{{ task_run_id }}.cairn_result
//! {{ parameters.region }}/{{ task_name }}.json
//! ```
//!
//! Undefined fields are errors, not empty strings: a template that mentions
//! `map_index` cannot be formatted for an unmapped task.

use std::fmt::{self, Write};
use std::sync::Arc;

use chrono::{DateTime, Datelike, Days, SecondsFormat, Utc};
use minijinja::{Environment, ErrorKind, UndefinedBehavior};
use serde_json::{Map, Value, json};

use crate::error::ResultError;

/// Where a result is written: a template or a function of the context.
#[derive(Clone)]
pub enum Location {
  Template(String),
  Callable(Arc<dyn Fn(&LocationContext) -> String + Send + Sync>),
}

impl Location {
  /// Build a callable location.
  pub fn callable(f: impl Fn(&LocationContext) -> String + Send + Sync + 'static) -> Self {
    Location::Callable(Arc::new(f))
  }

  pub fn render(&self, ctx: &LocationContext) -> Result<String, ResultError> {
    match self {
      Location::Template(template) => render_location(template, ctx),
      Location::Callable(f) => {
        let location = f(ctx);
        if location.trim().is_empty() {
          return Err(ResultError::EmptyLocation {
            template: "<callable>".to_string(),
          });
        }
        Ok(location)
      }
    }
  }
}

impl fmt::Debug for Location {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Location::Template(t) => f.debug_tuple("Template").field(t).finish(),
      Location::Callable(_) => f.write_str("Callable(..)"),
    }
  }
}

impl From<&str> for Location {
  fn from(template: &str) -> Self {
    Location::Template(template.to_string())
  }
}

impl From<String> for Location {
  fn from(template: String) -> Self {
    Location::Template(template)
  }
}

/// The fields a location template can refer to.
///
/// Unset optional fields are left out of the template context entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationContext {
  pub flow_name: Option<String>,
  pub flow_run_id: Option<String>,
  pub task_name: Option<String>,
  pub task_slug: Option<String>,
  pub task_full_name: Option<String>,
  pub task_run_id: Option<String>,
  pub map_index: Option<u32>,
  pub parameters: Map<String, Value>,
  /// The moment the result is formatted. Drives `date`, `today` and friends.
  pub date: DateTime<Utc>,
  /// Additional top-level fields.
  pub extra: Map<String, Value>,
}

impl Default for LocationContext {
  fn default() -> Self {
    Self::at(Utc::now())
  }
}

impl LocationContext {
  pub fn new() -> Self {
    Self::default()
  }

  /// An empty context pinned to `date`.
  pub fn at(date: DateTime<Utc>) -> Self {
    Self {
      flow_name: None,
      flow_run_id: None,
      task_name: None,
      task_slug: None,
      task_full_name: None,
      task_run_id: None,
      map_index: None,
      parameters: Map::new(),
      date,
      extra: Map::new(),
    }
  }

  pub fn with_flow(mut self, name: impl Into<String>, run_id: impl Into<String>) -> Self {
    self.flow_name = Some(name.into());
    self.flow_run_id = Some(run_id.into());
    self
  }

  /// Set the task name. The slug and full name default to it.
  pub fn with_task(mut self, name: impl Into<String>, run_id: impl Into<String>) -> Self {
    let name = name.into();
    self.task_slug.get_or_insert_with(|| name.clone());
    self.task_full_name.get_or_insert_with(|| name.clone());
    self.task_name = Some(name);
    self.task_run_id = Some(run_id.into());
    self
  }

  pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
    self.task_slug = Some(slug.into());
    self
  }

  pub fn with_map_index(mut self, index: u32) -> Self {
    self.map_index = Some(index);
    self.task_full_name = self
      .task_name
      .as_ref()
      .map(|name| format!("{}[{}]", name, index));
    self
  }

  pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
    self.parameters.insert(name.into(), value.into());
    self
  }

  pub fn with_extra(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
    self.extra.insert(name.into(), value.into());
    self
  }

  /// The template variables, as one JSON object.
  pub fn to_vars(&self) -> Map<String, Value> {
    let mut vars = self.extra.clone();

    let day = |d: DateTime<Utc>| d.format("%Y-%m-%d").to_string();
    let yesterday = self.date.checked_sub_days(Days::new(1)).unwrap_or(self.date);
    let tomorrow = self.date.checked_add_days(Days::new(1)).unwrap_or(self.date);

    vars.insert(
      "date".to_string(),
      json!(self.date.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
    );
    vars.insert("today".to_string(), json!(day(self.date)));
    vars.insert("yesterday".to_string(), json!(day(yesterday)));
    vars.insert("tomorrow".to_string(), json!(day(tomorrow)));
    vars.insert(
      "today_nodash".to_string(),
      json!(self.date.format("%Y%m%d").to_string()),
    );
    vars.insert(
      "parameters".to_string(),
      Value::Object(self.parameters.clone()),
    );

    let optional = [
      ("flow_name", &self.flow_name),
      ("flow_run_id", &self.flow_run_id),
      ("task_name", &self.task_name),
      ("task_slug", &self.task_slug),
      ("task_full_name", &self.task_full_name),
      ("task_run_id", &self.task_run_id),
    ];
    for (key, value) in optional {
      if let Some(v) = value {
        vars.insert(key.to_string(), json!(v));
      }
    }
    if let Some(index) = self.map_index {
      vars.insert("map_index".to_string(), json!(index));
    }

    vars
  }
}

/// Render a location template against the context.
pub fn render_location(template: &str, ctx: &LocationContext) -> Result<String, ResultError> {
  let mut env = Environment::new();
  env.set_undefined_behavior(UndefinedBehavior::Strict);
  env.add_filter("strftime", strftime);

  let vars = minijinja::Value::from_serialize(ctx.to_vars());
  let location = env
    .render_str(template, vars)
    .map_err(|e| ResultError::Template {
      template: template.to_string(),
      message: e.to_string(),
    })?;

  if location.trim().is_empty() {
    return Err(ResultError::EmptyLocation {
      template: template.to_string(),
    });
  }

  Ok(location)
}

/// `YYYY/M/D/<uuid>.cairn_result`, dated by the context.
pub fn default_location(ctx: &LocationContext) -> String {
  format!(
    "{}/{}/{}/{}.cairn_result",
    ctx.date.year(),
    ctx.date.month(),
    ctx.date.day(),
    uuid::Uuid::new_v4()
  )
}

/// `{{ date | strftime("%Y/%m") }}`
fn strftime(value: String, format: String) -> Result<String, minijinja::Error> {
  let dt = DateTime::parse_from_rfc3339(&value).map_err(|e| {
    minijinja::Error::new(
      ErrorKind::InvalidOperation,
      format!("strftime expects an RFC 3339 timestamp, got '{}': {}", value, e),
    )
  })?;

  let mut out = String::new();
  write!(out, "{}", dt.with_timezone(&Utc).format(&format)).map_err(|_| {
    minijinja::Error::new(
      ErrorKind::InvalidOperation,
      format!("invalid strftime format '{}'", format),
    )
  })?;
  Ok(out)
}
