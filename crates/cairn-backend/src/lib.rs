//! Cairn Backend
//!
//! This crate provides the storage trait results persist their serialized
//! bytes to, with a filesystem and an in-memory implementation.
//!
//! A backend only deals in opaque bytes addressed by a *location* string. It
//! never sees the value or the serializer; the result layer owns both.

mod fs;
mod memory;

pub use fs::LocalBackend;
pub use memory::MemoryBackend;

use async_trait::async_trait;
use bytes::Bytes;

/// Error type for backend operations.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
  /// Nothing is stored at the location.
  #[error("no result found at location: {0}")]
  NotFound(String),

  /// The location cannot address anything in this backend.
  #[error("invalid location '{location}': {message}")]
  InvalidLocation { location: String, message: String },

  /// An I/O error occurred.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// Byte storage addressed by location.
#[async_trait]
pub trait Backend: Send + Sync + std::fmt::Debug {
  /// Short type name, recorded alongside locations.
  fn kind(&self) -> &'static str;

  /// Read the bytes stored at `location`.
  async fn load(&self, location: &str) -> Result<Bytes, BackendError>;

  /// Store `data` at `location`, replacing anything already there.
  async fn store(&self, location: &str, data: Bytes) -> Result<(), BackendError>;

  async fn exists(&self, location: &str) -> Result<bool, BackendError>;

  async fn delete(&self, location: &str) -> Result<(), BackendError>;
}

pub(crate) fn check_location(location: &str) -> Result<(), BackendError> {
  if location.trim().is_empty() {
    return Err(BackendError::InvalidLocation {
      location: location.to_string(),
      message: "location is empty".to_string(),
    });
  }
  Ok(())
}
