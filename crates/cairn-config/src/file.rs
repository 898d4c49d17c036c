use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::ConfigError;

/// Parse a config file, choosing YAML for `.yaml`/`.yml` files and JSON
/// otherwise.
pub fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
  let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
    path: path.display().to_string(),
    source,
  })?;

  match path.extension().and_then(|e| e.to_str()) {
    Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
    _ => Ok(serde_json::from_str(&content)?),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ResultConfig;

  #[test]
  fn test_load_result_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("result.yml");
    std::fs::write(&path, "type: inline\n").unwrap();
    let config: ResultConfig = load_file(&path).unwrap();
    assert_eq!(config, ResultConfig::Inline);
  }

  #[test]
  fn test_missing_file() {
    let err = load_file::<ResultConfig>(Path::new("/nonexistent/result.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
  }
}
