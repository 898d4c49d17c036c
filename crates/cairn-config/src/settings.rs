use std::path::PathBuf;

use crate::error::ConfigError;

/// Overrides the cairn home directory (default `~/.cairn`).
pub const HOME_ENV: &str = "CAIRN_HOME";

/// Turns checkpointing of task outputs on or off.
pub const CHECKPOINTING_ENV: &str = "CAIRN__FLOWS__CHECKPOINTING";

/// Process-wide settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
  pub home_dir: PathBuf,
  /// Default directory for local results.
  pub results_dir: PathBuf,
  /// Whether task outputs are persisted at all.
  pub checkpointing: bool,
  /// SQLite file of the tracking store.
  pub database_path: PathBuf,
}

impl Settings {
  /// Settings rooted at `home_dir`, checkpointing off.
  pub fn new(home_dir: impl Into<PathBuf>) -> Self {
    let home_dir = home_dir.into();
    Self {
      results_dir: home_dir.join("results"),
      database_path: home_dir.join("cairn.db"),
      home_dir,
      checkpointing: false,
    }
  }

  /// Read settings from the process environment.
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_vars(|name| std::env::var(name).ok())
  }

  /// Read settings through `lookup`, which maps a variable name to its value.
  pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
    let home_dir = match lookup(HOME_ENV) {
      Some(dir) if !dir.is_empty() => PathBuf::from(dir),
      _ => dirs::home_dir()
        .ok_or(ConfigError::NoHomeDir)?
        .join(".cairn"),
    };

    let mut settings = Self::new(home_dir);
    if let Some(value) = lookup(CHECKPOINTING_ENV) {
      settings.checkpointing = parse_bool(&value).ok_or_else(|| ConfigError::InvalidEnv {
        name: CHECKPOINTING_ENV.to_string(),
        value,
      })?;
    }

    Ok(settings)
  }

  pub fn with_checkpointing(mut self, enabled: bool) -> Self {
    self.checkpointing = enabled;
    self
  }
}

/// Parse a boolean flag the way environment variables are usually written.
pub fn parse_bool(value: &str) -> Option<bool> {
  match value.trim().to_ascii_lowercase().as_str() {
    "true" | "1" | "yes" | "on" => Some(true),
    "false" | "0" | "no" | "off" | "" => Some(false),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use super::*;

  fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    move |name| map.get(name).cloned()
  }

  #[test]
  fn test_defaults_from_home() {
    let settings = Settings::from_vars(vars(&[(HOME_ENV, "/srv/cairn")])).unwrap();
    assert_eq!(settings.home_dir, PathBuf::from("/srv/cairn"));
    assert_eq!(settings.results_dir, PathBuf::from("/srv/cairn/results"));
    assert!(!settings.checkpointing);
    assert_eq!(settings.database_path, PathBuf::from("/srv/cairn/cairn.db"));
  }

  #[test]
  fn test_database_path_keeps_home_verbatim() {
    let settings = Settings::from_vars(vars(&[(HOME_ENV, "/srv/q?home%41")])).unwrap();
    assert_eq!(settings.database_path, PathBuf::from("/srv/q?home%41/cairn.db"));
  }

  #[test]
  fn test_checkpointing_env() {
    let settings =
      Settings::from_vars(vars(&[(HOME_ENV, "/srv/cairn"), (CHECKPOINTING_ENV, "TRUE")])).unwrap();
    assert!(settings.checkpointing);
  }

  #[test]
  fn test_invalid_checkpointing_env() {
    let err = Settings::from_vars(vars(&[(HOME_ENV, "/srv/cairn"), (CHECKPOINTING_ENV, "maybe")]))
      .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnv { .. }));
  }

  #[test]
  fn test_parse_bool() {
    assert_eq!(parse_bool("yes"), Some(true));
    assert_eq!(parse_bool(" 0 "), Some(false));
    assert_eq!(parse_bool("nope"), None);
  }
}
