//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, and environment variables.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use heron_core::RuntimeMode;
use heron_docs::DocsProvider;
use heron_telemetry::LogFormat;

use crate::{ConfigError, HeronConfig};

/// Configuration loader with layered approach.
///
/// The loader applies configuration in layers, with later layers overriding
/// earlier ones:
/// 1. Default values (built into the code)
/// 2. Configuration file (TOML or JSON)
/// 3. Environment variables
///
/// # Example
///
/// ```no_run
/// use heron_config::ConfigLoader;
///
/// # fn main() -> Result<(), heron_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("heron.toml")?
///     .with_env_prefix("HERON")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: HeronConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: HeronConfig::default(),
            env_prefix: None,
        }
    }

    /// Start with default configuration values.
    ///
    /// This is called automatically by `new()`, but can be chained for clarity.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = HeronConfig::default();
        self
    }

    /// Start with development preset configuration.
    ///
    /// ```
    /// use heron_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = HeronConfig::development();
        self
    }

    /// Start with production preset configuration.
    ///
    /// ```
    /// use heron_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_production().load().unwrap();
    /// assert!(config.mode.is_production());
    /// ```
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = HeronConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// Supports TOML (.toml) and JSON (.json) formats, chosen by extension.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML/JSON
    /// - The file contains unknown fields
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        self.config = parse(&content, &extension)?;

        tracing::debug!(path = %path.display(), "loaded configuration file");
        Ok(self)
    }

    /// Load configuration from an optional file.
    ///
    /// If the file exists, loads it. If not, silently continues.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string.
    ///
    /// `format` is `"toml"` or `"json"`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails or the format is unknown.
    ///
    /// # Example
    ///
    /// ```
    /// use heron_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     auto_generate = false
    ///
    ///     [openapi.info]
    ///     title = "Todo API"
    ///     version = "1.0.0"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert!(!config.auto_generate);
    /// assert_eq!(config.openapi.info.title, "Todo API");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, &format.to_lowercase())?;
        Ok(self)
    }

    /// Set environment variable prefix for overrides.
    ///
    /// Environment variables use the format `PREFIX__SECTION__KEY`.
    /// For example, with prefix "HERON":
    /// - `HERON__MODE=production`
    /// - `HERON__SERVER__HTTP_ADDR=127.0.0.1:8080`
    /// - `HERON__DENIED_PATHS=/api/internal/**,/api/admin/**`
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Finalize and return the loaded configuration.
    ///
    /// Applies environment variable overrides (if a prefix was set) and
    /// validates the final configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an environment variable does not parse or
    /// validation fails.
    pub fn load(mut self) -> Result<HeronConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// Finalize without validation or environment overrides.
    #[must_use]
    pub fn load_unvalidated(self) -> HeronConfig {
        self.config
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let marker = format!("{prefix}__");
        let mut vars: Vec<(String, String)> = env::vars()
            .filter(|(k, _)| k.starts_with(&marker))
            .collect();
        vars.sort();

        for (key, value) in vars {
            self.apply_env_var(&key, &value, &marker)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, marker: &str) -> Result<(), ConfigError> {
        let Some(rest) = key.strip_prefix(marker) else {
            return Err(ConfigError::env_parse_error(key, "invalid key format"));
        };
        let parts: Vec<&str> = rest.split("__").collect();

        match parts.as_slice() {
            ["MODE"] => {
                self.config.mode = match value.trim().to_lowercase().as_str() {
                    "production" => RuntimeMode::Production,
                    "development" => RuntimeMode::Development,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'development' or 'production'",
                        ))
                    }
                };
            }
            ["OPENAPI_JSON_PATH"] => self.config.openapi_json_path = value.to_string(),
            ["SPEC_OUTPUT"] => self.config.spec_output = PathBuf::from(value),
            ["AUTO_GENERATE"] => self.config.auto_generate = require_bool(key, value)?,
            ["SUPPRESS_INFO"] => self.config.suppress_info = require_bool(key, value)?,
            ["ALLOWED_PATHS"] => {
                self.config.allowed_paths = if value.trim().is_empty() {
                    None
                } else {
                    Some(split_list(value))
                };
            }
            ["DENIED_PATHS"] => self.config.denied_paths = split_list(value),

            // Docs section
            ["DOCS", "PROVIDER"] => {
                self.config.docs.provider = match value.trim().to_lowercase().as_str() {
                    "redoc" => DocsProvider::Redoc,
                    "swagger-ui" | "swagger_ui" | "swagger" => DocsProvider::SwaggerUi,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'redoc' or 'swagger-ui'",
                        ))
                    }
                };
            }
            ["DOCS", "TITLE"] => self.config.docs.title = non_empty(value),
            ["DOCS", "DESCRIPTION"] => self.config.docs.description = non_empty(value),

            // Server section
            ["SERVER", "HTTP_ADDR"] => self.config.server.http_addr = value.to_string(),
            ["SERVER", "DOCS_PATH"] => self.config.server.docs_path = value.to_string(),
            ["SERVER", "REQUEST_TIMEOUT_SECS"] => {
                self.config.server.request_timeout_secs = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            ["SERVER", "MAX_BODY_BYTES"] => {
                self.config.server.max_body_bytes = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }

            // Logging section
            ["LOGGING", "ENABLED"] => self.config.logging.enabled = require_bool(key, value)?,
            ["LOGGING", "LEVEL"] => self.config.logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = match value.trim().to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    "compact" => LogFormat::Compact,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json', 'pretty', or 'compact'",
                        ))
                    }
                };
            }

            _ => {
                tracing::warn!(var = key, "ignoring unknown configuration variable");
            }
        }

        Ok(())
    }
}

fn parse(content: &str, format: &str) -> Result<HeronConfig, ConfigError> {
    match format {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::UnsupportedFormat {
            format: other.to_string(),
        }),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn require_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, HeronConfig::default());
    }

    #[test]
    fn test_load_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
            openapi_json_path = "/spec.json"
            denied_paths = ["/api/internal/**"]

            [docs]
            provider = "swagger-ui"

            [server]
            http_addr = "127.0.0.1:4000"
            "#
        )
        .unwrap();

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert_eq!(config.openapi_json_path, "/spec.json");
        assert_eq!(config.docs.provider, DocsProvider::SwaggerUi);
        assert_eq!(config.server.http_addr, "127.0.0.1:4000");
        assert_eq!(config.denied_paths, vec!["/api/internal/**".to_string()]);
    }

    #[test]
    fn test_load_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{ "suppress_info": true, "mode": "production" }}"#).unwrap();

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert!(config.suppress_info);
        assert!(config.mode.is_production());
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigLoader::new().with_file("/definitely/not/here.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_optional_missing_file() {
        let loader = ConfigLoader::new()
            .with_optional_file("/definitely/not/here.toml")
            .unwrap();
        assert!(loader.load().is_ok());
    }

    #[test]
    fn test_unsupported_format() {
        let result = ConfigLoader::new().with_string("a: 1", "yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_unknown_field_is_error() {
        let result = ConfigLoader::new().with_string("autoGenerate = true", "toml");
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn test_env_overrides() {
        let prefix = "HERON_TEST_ENV_OVERRIDES";
        env::set_var(format!("{prefix}__AUTO_GENERATE"), "false");
        env::set_var(format!("{prefix}__DENIED_PATHS"), "/a/**, /b");
        env::set_var(format!("{prefix}__SERVER__REQUEST_TIMEOUT_SECS"), "5");
        env::set_var(format!("{prefix}__LOGGING__FORMAT"), "compact");

        let config = ConfigLoader::new().with_env_prefix(prefix).load().unwrap();
        assert!(!config.auto_generate);
        assert_eq!(config.denied_paths, vec!["/a/**".to_string(), "/b".to_string()]);
        assert_eq!(config.server.request_timeout_secs, 5);
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn test_env_parse_error() {
        let prefix = "HERON_TEST_ENV_BAD_BOOL";
        env::set_var(format!("{prefix}__SUPPRESS_INFO"), "sometimes");

        let result = ConfigLoader::new().with_env_prefix(prefix).load();
        assert!(matches!(result, Err(ConfigError::EnvParseError { .. })));
    }

    #[test]
    fn test_env_override_is_validated() {
        let prefix = "HERON_TEST_ENV_VALIDATED";
        env::set_var(format!("{prefix}__SERVER__DOCS_PATH"), "docs");

        let result = ConfigLoader::new().with_env_prefix(prefix).load();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
