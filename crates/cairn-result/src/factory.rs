//! Building results from configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cairn_backend::{LocalBackend, MemoryBackend};
use cairn_config::{ResultConfig, SerializerConfig, Settings};

use crate::result::TaskResult;

/// Builds [`TaskResult`]s from [`ResultConfig`]s.
///
/// Every `memory` result built by one factory shares the same
/// [`MemoryBackend`], so a value written through one can be read through
/// another.
#[derive(Debug, Clone)]
pub struct ResultFactory {
  settings: Settings,
  memory: MemoryBackend,
}

impl ResultFactory {
  pub fn new(settings: Settings) -> Self {
    Self {
      settings,
      memory: MemoryBackend::new(),
    }
  }

  pub fn settings(&self) -> &Settings {
    &self.settings
  }

  /// The backend shared by all `memory` results.
  pub fn memory_backend(&self) -> &MemoryBackend {
    &self.memory
  }

  pub fn build(&self, config: &ResultConfig) -> TaskResult {
    match config {
      ResultConfig::Local {
        dir,
        location,
        serializer,
      } => {
        let dir = dir
          .as_deref()
          .map(expand_home)
          .unwrap_or_else(|| self.settings.results_dir.clone());
        let result = TaskResult::new(Arc::new(LocalBackend::new(dir)));
        configure(result, location, serializer)
      }
      ResultConfig::Memory {
        location,
        serializer,
      } => {
        let result = TaskResult::new(Arc::new(self.memory.clone()));
        configure(result, location, serializer)
      }
      ResultConfig::Inline => TaskResult::inline(),
      ResultConfig::Constant { value } => TaskResult::constant(value.clone()),
      ResultConfig::None => TaskResult::no_result(),
    }
  }

  /// The result used when neither the task nor its flow configures one.
  pub fn default_result(&self) -> TaskResult {
    TaskResult::new(Arc::new(LocalBackend::new(&self.settings.results_dir)))
  }
}

fn configure(
  mut result: TaskResult,
  location: &Option<String>,
  serializer: &Option<SerializerConfig>,
) -> TaskResult {
  if let Some(location) = location {
    result = result.with_location(location.as_str());
  }
  if let Some(serializer) = serializer {
    result = result.with_serializer(cairn_serializer::from_config(serializer));
  }
  result
}

/// Replace a leading `~` with the user's home directory.
fn expand_home(path: &Path) -> PathBuf {
  match path.strip_prefix("~") {
    Ok(rest) => match dirs::home_dir() {
      Some(home) => home.join(rest),
      None => path.to_path_buf(),
    },
    Err(_) => path.to_path_buf(),
  }
}
