use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bytes::Bytes;

use crate::{Backend, BackendError, check_location};

/// In-process backend. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
  entries: Arc<RwLock<HashMap<String, Bytes>>>,
}

impl MemoryBackend {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of stored locations.
  pub fn len(&self) -> usize {
    self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// All stored locations, sorted.
  pub fn locations(&self) -> Vec<String> {
    let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
    let mut locations: Vec<String> = entries.keys().cloned().collect();
    locations.sort();
    locations
  }
}

#[async_trait]
impl Backend for MemoryBackend {
  fn kind(&self) -> &'static str {
    "memory"
  }

  async fn load(&self, location: &str) -> Result<Bytes, BackendError> {
    check_location(location)?;
    let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
    entries
      .get(location)
      .cloned()
      .ok_or_else(|| BackendError::NotFound(location.to_string()))
  }

  async fn store(&self, location: &str, data: Bytes) -> Result<(), BackendError> {
    check_location(location)?;
    let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
    entries.insert(location.to_string(), data);
    Ok(())
  }

  async fn exists(&self, location: &str) -> Result<bool, BackendError> {
    check_location(location)?;
    let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
    Ok(entries.contains_key(location))
  }

  async fn delete(&self, location: &str) -> Result<(), BackendError> {
    check_location(location)?;
    let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
    entries
      .remove(location)
      .map(|_| ())
      .ok_or_else(|| BackendError::NotFound(location.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_clones_share_storage() {
    let backend = MemoryBackend::new();
    let clone = backend.clone();

    clone
      .store("a.json", Bytes::from_static(b"1"))
      .await
      .unwrap();

    assert!(backend.exists("a.json").await.unwrap());
    assert_eq!(backend.load("a.json").await.unwrap(), Bytes::from_static(b"1"));
    assert_eq!(backend.locations(), vec!["a.json".to_string()]);
  }

  #[tokio::test]
  async fn test_delete() {
    let backend = MemoryBackend::new();
    backend.store("a", Bytes::from_static(b"1")).await.unwrap();
    backend.delete("a").await.unwrap();
    assert!(backend.is_empty());
    assert!(matches!(
      backend.delete("a").await,
      Err(BackendError::NotFound(_))
    ));
  }
}
