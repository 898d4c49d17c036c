use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileTaskError {
  #[error("No `source_path` provided")]
  MissingSourcePath,

  #[error("No `target_path` provided")]
  MissingTargetPath,

  #[error("No `remove_path` provided")]
  MissingRemovePath,

  #[error("target already exists: {0}")]
  TargetExists(PathBuf),

  #[error("{operation} failed for '{path}': {source}")]
  Io {
    operation: &'static str,
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}
