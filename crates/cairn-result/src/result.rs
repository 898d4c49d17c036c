use std::sync::Arc;

use bytes::Bytes;
use cairn_backend::{Backend, LocalBackend};
use cairn_serializer::{JsonSerializer, Serializer, default_serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::ResultError;
use crate::location::{Location, LocationContext, default_location, render_location};
use crate::value::ResultValue;

/// What a result's location refers to.
#[derive(Debug, Clone)]
pub enum Storage {
  /// The location is a key in a byte backend.
  Backend(Arc<dyn Backend>),
  /// The location is the JSON-encoded value itself.
  Inline,
  /// A fixed value. Reads return it, writes are rejected.
  Constant,
  /// Nothing was computed. Never persisted.
  NoResult,
}

/// The part of a result that is handed to tracking stores.
///
/// It never contains the value, only what is needed to read it back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
  pub kind: String,
  pub location: String,
  pub serializer: String,
}

/// A task's output and where it lives.
#[derive(Debug, Clone)]
pub struct TaskResult {
  value: ResultValue,
  location: Option<String>,
  template: Option<Location>,
  serializer: Arc<dyn Serializer>,
  storage: Storage,
}

impl TaskResult {
  /// A result persisted to `backend` with the default serializer.
  pub fn new(backend: Arc<dyn Backend>) -> Self {
    Self {
      value: ResultValue::NoResult,
      location: None,
      template: None,
      serializer: default_serializer(),
      storage: Storage::Backend(backend),
    }
  }

  /// A result stored as files under `dir`.
  pub fn local(dir: impl Into<std::path::PathBuf>) -> Self {
    Self::new(Arc::new(LocalBackend::new(dir)))
  }

  /// A result whose location is its JSON-encoded value.
  pub fn inline() -> Self {
    Self {
      value: ResultValue::NoResult,
      location: None,
      template: None,
      serializer: Arc::new(JsonSerializer::default()),
      storage: Storage::Inline,
    }
  }

  /// A result that always holds `value`.
  pub fn constant(value: Value) -> Self {
    Self {
      value: ResultValue::Value(value),
      location: None,
      template: None,
      serializer: default_serializer(),
      storage: Storage::Constant,
    }
  }

  /// The result of a task that computed nothing.
  pub fn no_result() -> Self {
    Self {
      value: ResultValue::NoResult,
      location: None,
      template: None,
      serializer: default_serializer(),
      storage: Storage::NoResult,
    }
  }

  /// Set the location template (or callable) used by [`format`](Self::format).
  pub fn with_location(mut self, location: impl Into<Location>) -> Self {
    self.template = Some(location.into());
    self
  }

  /// Set the serializer. Inline results always use JSON and ignore this.
  pub fn with_serializer(mut self, serializer: Arc<dyn Serializer>) -> Self {
    if !matches!(self.storage, Storage::Inline) {
      self.serializer = serializer;
    }
    self
  }

  pub fn value(&self) -> &ResultValue {
    &self.value
  }

  /// The formatted location, if this result has been formatted, written or read.
  pub fn location(&self) -> Option<&str> {
    self.location.as_deref()
  }

  pub fn template(&self) -> Option<&Location> {
    self.template.as_ref()
  }

  pub fn serializer(&self) -> &Arc<dyn Serializer> {
    &self.serializer
  }

  pub fn storage(&self) -> &Storage {
    &self.storage
  }

  pub fn is_no_result(&self) -> bool {
    matches!(self.storage, Storage::NoResult)
  }

  /// Short type name: the backend's kind, `inline`, `constant` or `no_result`.
  pub fn kind(&self) -> &'static str {
    match &self.storage {
      Storage::Backend(backend) => backend.kind(),
      Storage::Inline => "inline",
      Storage::Constant => "constant",
      Storage::NoResult => "no_result",
    }
  }

  /// A copy holding `value`, with no location.
  pub fn from_value(&self, value: impl Into<ResultValue>) -> Self {
    let mut new = self.clone();
    new.value = value.into();
    new.location = None;
    new
  }

  /// A copy whose location is rendered for `ctx`.
  ///
  /// Backend results render their template, or fall back to
  /// [`default_location`]. Inline results derive the location from their
  /// value. Constant and NoResult results are returned unchanged.
  pub fn format(&self, ctx: &LocationContext) -> Result<Self, ResultError> {
    let mut new = self.clone();
    match &self.storage {
      Storage::Backend(_) => {
        new.location = Some(match &self.template {
          Some(template) => template.render(ctx)?,
          None => default_location(ctx),
        });
      }
      Storage::Inline => {
        if let Some(value) = self.value.as_value() {
          new.location = Some(self.encode_inline(value)?);
        }
      }
      Storage::Constant | Storage::NoResult => {}
    }
    Ok(new)
  }

  /// Persist `value` at the location formatted for `ctx`.
  pub async fn write(
    &self,
    value: impl Into<ResultValue>,
    ctx: &LocationContext,
  ) -> Result<Self, ResultError> {
    let value = value.into();
    self.check_writable(&value)?;
    let formatted = self.format(ctx)?;
    formatted.persist(value, None).await
  }

  /// Persist `value` at an already formatted `location`.
  pub async fn write_at(
    &self,
    value: impl Into<ResultValue>,
    location: impl Into<String>,
  ) -> Result<Self, ResultError> {
    let value = value.into();
    self.check_writable(&value)?;
    self.persist(value, Some(location.into())).await
  }

  /// A copy bound to `location`, with the value read from storage.
  pub async fn read(&self, location: &str) -> Result<Self, ResultError> {
    let mut new = self.clone();
    match &self.storage {
      Storage::Backend(backend) => {
        let bytes = backend.load(location).await?;
        new.value = ResultValue::Value(self.serializer.deserialize(&bytes)?);
        new.location = Some(location.to_string());
        info!(
          kind = backend.kind(),
          location = %location,
          serializer = self.serializer.name(),
          "result_read"
        );
      }
      Storage::Inline => {
        new.value = ResultValue::Value(self.serializer.deserialize(location.as_bytes())?);
        new.location = Some(location.to_string());
      }
      Storage::Constant | Storage::NoResult => {}
    }
    Ok(new)
  }

  /// Whether a value exists at `location`, rendered as a template for `ctx`.
  pub async fn exists(&self, location: &str, ctx: &LocationContext) -> Result<bool, ResultError> {
    match &self.storage {
      Storage::Backend(backend) => {
        let rendered = render_location(location, ctx)?;
        let exists = backend.exists(&rendered).await?;
        debug!(location = %rendered, exists, "checked result location");
        Ok(exists)
      }
      Storage::Inline | Storage::Constant => Ok(true),
      Storage::NoResult => Ok(false),
    }
  }

  /// What a tracking store may persist about this result.
  ///
  /// `None` until the result has a location.
  pub fn record(&self) -> Option<ResultRecord> {
    self.location.as_ref().map(|location| ResultRecord {
      kind: self.kind().to_string(),
      location: location.clone(),
      serializer: self.serializer.name().to_string(),
    })
  }

  fn check_writable(&self, value: &ResultValue) -> Result<(), ResultError> {
    match self.storage {
      Storage::Constant | Storage::NoResult => Err(ResultError::ReadOnly { kind: self.kind() }),
      _ if value.is_no_result() => Err(ResultError::NothingToWrite),
      _ => Ok(()),
    }
  }

  fn encode_inline(&self, value: &Value) -> Result<String, ResultError> {
    let bytes = self.serializer.serialize(value)?;
    String::from_utf8(bytes).map_err(|e| {
      ResultError::Serializer(cairn_serializer::SerializerError::InvalidBytes {
        serializer: self.serializer.name(),
        message: e.to_string(),
      })
    })
  }

  async fn persist(
    &self,
    value: ResultValue,
    location: Option<String>,
  ) -> Result<Self, ResultError> {
    let mut new = self.clone();
    let Some(data) = value.as_value() else {
      return Err(ResultError::NothingToWrite);
    };

    match &self.storage {
      Storage::Backend(backend) => {
        let location = match location.or_else(|| self.location.clone()) {
          Some(location) => location,
          None => default_location(&LocationContext::new()),
        };
        let bytes = Bytes::from(self.serializer.serialize(data)?);
        let size = bytes.len();
        backend.store(&location, bytes).await?;
        info!(
          kind = backend.kind(),
          location = %location,
          serializer = self.serializer.name(),
          bytes = size,
          "result_written"
        );
        new.location = Some(location);
      }
      Storage::Inline => {
        new.location = Some(self.encode_inline(data)?);
      }
      Storage::Constant | Storage::NoResult => {
        return Err(ResultError::ReadOnly { kind: self.kind() });
      }
    }

    new.value = value;
    Ok(new)
  }
}
