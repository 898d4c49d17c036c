use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config file '{path}': {source}")]
  Read {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid JSON config: {0}")]
  Json(#[from] serde_json::Error),

  #[error("invalid YAML config: {0}")]
  Yaml(#[from] serde_yaml::Error),

  #[error("invalid value for {name}: '{value}'")]
  InvalidEnv { name: String, value: String },

  #[error("could not determine home directory")]
  NoHomeDir,

  #[error("task not found in flow '{flow}': {task}")]
  TaskNotFound { flow: String, task: String },
}
