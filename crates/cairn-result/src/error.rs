//! Result errors.

use cairn_backend::BackendError;
use cairn_serializer::SerializerError;

/// Errors that can occur while formatting, writing or reading a result.
#[derive(Debug, thiserror::Error)]
pub enum ResultError {
  /// The location template could not be rendered.
  #[error("failed to render location '{template}': {message}")]
  Template { template: String, message: String },

  /// The location rendered to an empty string.
  #[error("location '{template}' rendered to an empty string")]
  EmptyLocation { template: String },

  #[error("serialization failed: {0}")]
  Serializer(#[from] SerializerError),

  #[error("storage failed: {0}")]
  Backend(#[from] BackendError),

  /// NoResult means nothing was computed, so there is nothing to persist.
  #[error("cannot write NoResult")]
  NothingToWrite,

  /// This kind of result never accepts writes.
  #[error("cannot write values to a {kind} result")]
  ReadOnly { kind: &'static str },
}
