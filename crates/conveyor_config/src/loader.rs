//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::{CacheBackendKind, PipelineConfig};
use std::path::Path;

/// Loads and validates a `conveyor.toml` configuration from a project
/// directory.
pub fn load_config(project_dir: &Path) -> Result<PipelineConfig, ConfigError> {
    let config_path = project_dir.join("conveyor.toml");
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `conveyor.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<PipelineConfig, ConfigError> {
    let config: PipelineConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &PipelineConfig) -> Result<(), ConfigError> {
    if config.pipeline.paths.is_empty() {
        return Err(ConfigError::MissingField("pipeline.paths".to_string()));
    }
    if config.pipeline.paths.iter().any(|p| p.is_empty()) {
        return Err(ConfigError::ValidationError(
            "pipeline.paths entries must be non-empty".to_string(),
        ));
    }
    if config.cache.backend == CacheBackendKind::Filesystem && config.cache.directory.is_none() {
        return Err(ConfigError::MissingField("cache.directory".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DigestAlgorithm;

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
[pipeline]
paths = ["app/assets/javascripts", "vendor/assets"]
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.pipeline.paths.len(), 2);
        assert_eq!(config.pipeline.version, "");
        assert_eq!(config.pipeline.digest, DigestAlgorithm::Sha256);
        assert_eq!(config.cache.backend, CacheBackendKind::Memory);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[pipeline]
paths = ["app/assets"]
version = "v3"
digest = "sha512"

[cache]
backend = "filesystem"
directory = "tmp/cache/assets"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.pipeline.version, "v3");
        assert_eq!(config.pipeline.digest, DigestAlgorithm::Sha512);
        assert_eq!(config.cache.backend, CacheBackendKind::Filesystem);
        assert_eq!(config.cache.directory.as_deref(), Some("tmp/cache/assets"));
    }

    #[test]
    fn empty_paths_errors() {
        let toml = r#"
[pipeline]
paths = []
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn blank_path_entry_errors() {
        let toml = r#"
[pipeline]
paths = ["app/assets", ""]
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn filesystem_backend_requires_directory() {
        let toml = r#"
[pipeline]
paths = ["app/assets"]

[cache]
backend = "filesystem"
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn io_error_from_nonexistent_dir() {
        let err = load_config(Path::new("/nonexistent/dir")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
