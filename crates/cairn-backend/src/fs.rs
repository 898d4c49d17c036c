use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::{Backend, BackendError, check_location};

/// Filesystem-based result backend.
///
/// A relative location is stored at `{dir}/{location}`; an absolute location
/// is used as-is. Parent directories are created automatically.
#[derive(Debug, Clone)]
pub struct LocalBackend {
  dir: PathBuf,
}

impl LocalBackend {
  /// Create a backend rooted at `dir` without touching the filesystem.
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  /// Create a backend rooted at `dir`, creating the directory if needed.
  ///
  /// Fails if `dir` exists and is not a directory.
  pub async fn validated(dir: impl Into<PathBuf>) -> Result<Self, BackendError> {
    let dir = dir.into();
    match fs::metadata(&dir).await {
      Ok(meta) if meta.is_dir() => {}
      Ok(_) => {
        return Err(BackendError::InvalidLocation {
          location: dir.display().to_string(),
          message: "result directory exists but is not a directory".to_string(),
        });
      }
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        fs::create_dir_all(&dir).await?;
      }
      Err(e) => return Err(BackendError::Io(e)),
    }
    Ok(Self { dir })
  }

  /// The base directory.
  pub fn dir(&self) -> &Path {
    &self.dir
  }

  /// Resolve a location to the file it is stored in.
  pub fn path_for(&self, location: &str) -> PathBuf {
    let path = Path::new(location);
    if path.is_absolute() {
      path.to_path_buf()
    } else {
      self.dir.join(path)
    }
  }

  fn not_found(location: &str, e: std::io::Error) -> BackendError {
    if e.kind() == std::io::ErrorKind::NotFound {
      BackendError::NotFound(location.to_string())
    } else {
      BackendError::Io(e)
    }
  }
}

#[async_trait]
impl Backend for LocalBackend {
  fn kind(&self) -> &'static str {
    "local"
  }

  async fn load(&self, location: &str) -> Result<Bytes, BackendError> {
    check_location(location)?;
    let path = self.path_for(location);
    let data = fs::read(&path)
      .await
      .map_err(|e| Self::not_found(location, e))?;
    debug!(path = %path.display(), bytes = data.len(), "loaded result file");
    Ok(Bytes::from(data))
  }

  async fn store(&self, location: &str, data: Bytes) -> Result<(), BackendError> {
    check_location(location)?;
    let path = self.path_for(location);

    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).await?;
    }

    let mut file = File::create(&path).await?;
    file.write_all(&data).await?;
    file.flush().await?;

    debug!(path = %path.display(), bytes = data.len(), "stored result file");
    Ok(())
  }

  async fn exists(&self, location: &str) -> Result<bool, BackendError> {
    check_location(location)?;
    Ok(fs::try_exists(self.path_for(location)).await?)
  }

  async fn delete(&self, location: &str) -> Result<(), BackendError> {
    check_location(location)?;
    fs::remove_file(self.path_for(location))
      .await
      .map_err(|e| Self::not_found(location, e))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_store_and_load_nested() {
    let tmp = tempfile::tempdir().unwrap();
    let backend = LocalBackend::new(tmp.path());

    backend
      .store("flow/task/2024-01-01.json", Bytes::from_static(b"{\"a\":1}"))
      .await
      .unwrap();

    assert!(tmp.path().join("flow/task/2024-01-01.json").is_file());
    assert!(backend.exists("flow/task/2024-01-01.json").await.unwrap());
    assert_eq!(
      backend.load("flow/task/2024-01-01.json").await.unwrap(),
      Bytes::from_static(b"{\"a\":1}")
    );
  }

  #[tokio::test]
  async fn test_absolute_location_ignores_dir() {
    let base = tempfile::tempdir().unwrap();
    let other = tempfile::tempdir().unwrap();
    let backend = LocalBackend::new(base.path());
    let absolute = other.path().join("out.bin");
    let location = absolute.to_str().unwrap();

    backend
      .store(location, Bytes::from_static(b"raw"))
      .await
      .unwrap();

    assert!(absolute.is_file());
    assert_eq!(backend.path_for(location), absolute);
  }

  #[tokio::test]
  async fn test_missing_location() {
    let tmp = tempfile::tempdir().unwrap();
    let backend = LocalBackend::new(tmp.path());

    assert!(!backend.exists("nope.json").await.unwrap());
    assert!(matches!(
      backend.load("nope.json").await,
      Err(BackendError::NotFound(l)) if l == "nope.json"
    ));
    assert!(matches!(
      backend.delete("nope.json").await,
      Err(BackendError::NotFound(_))
    ));
  }

  #[tokio::test]
  async fn test_empty_location_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let backend = LocalBackend::new(tmp.path());
    assert!(matches!(
      backend.store("  ", Bytes::new()).await,
      Err(BackendError::InvalidLocation { .. })
    ));
  }

  #[tokio::test]
  async fn test_validated_creates_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("results");
    let backend = LocalBackend::validated(&dir).await.unwrap();
    assert!(dir.is_dir());
    assert_eq!(backend.dir(), dir.as_path());
  }

  #[tokio::test]
  async fn test_validated_rejects_file() {
    let tmp = tempfile::tempdir().unwrap();
    let file = tmp.path().join("not-a-dir");
    std::fs::write(&file, b"x").unwrap();
    assert!(matches!(
      LocalBackend::validated(&file).await,
      Err(BackendError::InvalidLocation { .. })
    ));
  }
}
