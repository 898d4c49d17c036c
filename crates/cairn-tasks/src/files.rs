use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

use crate::error::FileTaskError;

/// Move a file or directory.
///
/// Moving into an existing directory places the source inside it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
  #[serde(default)]
  pub source_path: PathBuf,
  #[serde(default)]
  pub target_path: PathBuf,
}

impl Move {
  pub fn new(source_path: impl Into<PathBuf>, target_path: impl Into<PathBuf>) -> Self {
    Self {
      source_path: source_path.into(),
      target_path: target_path.into(),
    }
  }

  /// Returns the path the source ended up at.
  pub async fn run(
    &self,
    source_path: Option<&Path>,
    target_path: Option<&Path>,
  ) -> Result<PathBuf, FileTaskError> {
    let source = pick(source_path, &self.source_path).ok_or(FileTaskError::MissingSourcePath)?;
    let target = pick(target_path, &self.target_path).ok_or(FileTaskError::MissingTargetPath)?;
    let destination = destination(source, target).await;

    match fs::rename(source, &destination).await {
      Ok(()) => {}
      // rename cannot cross filesystems; fall back to copy + remove
      Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
        copy_any(source, &destination).await?;
        remove_any(source).await?;
      }
      Err(source_err) => {
        return Err(io_error("move", source, source_err));
      }
    }

    info!(source = %source.display(), target = %destination.display(), "moved");
    Ok(destination)
  }
}

/// Copy a file or directory tree.
///
/// Copying a file into an existing directory places it inside it. A directory
/// is copied to the target path itself, which must not exist yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Copy {
  #[serde(default)]
  pub source_path: PathBuf,
  #[serde(default)]
  pub target_path: PathBuf,
}

impl Copy {
  pub fn new(source_path: impl Into<PathBuf>, target_path: impl Into<PathBuf>) -> Self {
    Self {
      source_path: source_path.into(),
      target_path: target_path.into(),
    }
  }

  /// Returns the path of the copy.
  pub async fn run(
    &self,
    source_path: Option<&Path>,
    target_path: Option<&Path>,
  ) -> Result<PathBuf, FileTaskError> {
    let source = pick(source_path, &self.source_path).ok_or(FileTaskError::MissingSourcePath)?;
    let target = pick(target_path, &self.target_path).ok_or(FileTaskError::MissingTargetPath)?;

    let destination = if is_dir(source).await {
      if fs::try_exists(target)
        .await
        .map_err(|e| io_error("copy", target, e))?
      {
        return Err(FileTaskError::TargetExists(target.to_path_buf()));
      }
      target.to_path_buf()
    } else {
      destination(source, target).await
    };

    copy_any(source, &destination).await?;
    info!(source = %source.display(), target = %destination.display(), "copied");
    Ok(destination)
  }
}

/// Remove a file or a whole directory tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remove {
  #[serde(default)]
  pub remove_path: PathBuf,
}

impl Remove {
  pub fn new(remove_path: impl Into<PathBuf>) -> Self {
    Self {
      remove_path: remove_path.into(),
    }
  }

  pub async fn run(&self, remove_path: Option<&Path>) -> Result<(), FileTaskError> {
    let path = pick(remove_path, &self.remove_path).ok_or(FileTaskError::MissingRemovePath)?;
    remove_any(path).await?;
    info!(path = %path.display(), "removed");
    Ok(())
  }
}

/// The run argument if given, else the configured path; empty means missing.
fn pick<'a>(arg: Option<&'a Path>, configured: &'a Path) -> Option<&'a Path> {
  let path = arg.unwrap_or(configured);
  (!path.as_os_str().is_empty()).then_some(path)
}

/// `target/<source file name>` when target is an existing directory.
async fn destination(source: &Path, target: &Path) -> PathBuf {
  match source.file_name() {
    Some(name) if is_dir(target).await => target.join(name),
    _ => target.to_path_buf(),
  }
}

async fn is_dir(path: &Path) -> bool {
  fs::metadata(path)
    .await
    .map(|m| m.is_dir())
    .unwrap_or(false)
}

async fn copy_any(source: &Path, destination: &Path) -> Result<(), FileTaskError> {
  if is_dir(source).await {
    copy_dir_recursive(source, destination)
      .await
      .map_err(|e| io_error("copy", source, e))
  } else {
    fs::copy(source, destination)
      .await
      .map(|_| ())
      .map_err(|e| io_error("copy", source, e))
  }
}

async fn remove_any(path: &Path) -> Result<(), FileTaskError> {
  let result = if is_dir(path).await {
    fs::remove_dir_all(path).await
  } else {
    fs::remove_file(path).await
  };
  result.map_err(|e| io_error("remove", path, e))
}

/// Recursively copy a directory.
async fn copy_dir_recursive(src: &Path, dest: &Path) -> Result<(), std::io::Error> {
  fs::create_dir_all(dest).await?;

  let mut entries = fs::read_dir(src).await?;
  while let Some(entry) = entries.next_entry().await? {
    let src_path = entry.path();
    let dest_path = dest.join(entry.file_name());

    if entry.file_type().await?.is_dir() {
      Box::pin(copy_dir_recursive(&src_path, &dest_path)).await?;
    } else {
      fs::copy(&src_path, &dest_path).await?;
    }
  }

  Ok(())
}

fn io_error(operation: &'static str, path: &Path, source: std::io::Error) -> FileTaskError {
  FileTaskError::Io {
    operation,
    path: path.to_path_buf(),
    source,
  }
}
