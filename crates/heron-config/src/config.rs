//! Configuration types.
//!
//! This module provides the top-level [`HeronConfig`] struct and its
//! sections.

use std::net::SocketAddr;
use std::path::PathBuf;

use heron_core::RuntimeMode;
use heron_docs::{DocsPage, DocsProvider, OpenApi, PathFilter};
use heron_telemetry::{LogConfig, LogFormat};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Complete Heron configuration.
///
/// Every field has a default, so an empty file is a valid configuration.
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use heron_config::HeronConfig;
///
/// let config = HeronConfig::default();
/// assert_eq!(config.openapi_json_path, "/openapi.json");
/// assert!(config.auto_generate);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HeronConfig {
    /// Base OpenAPI document. Everything but `paths` is served as given.
    #[serde(default)]
    pub openapi: OpenApi,

    /// URL path the OpenAPI JSON is served from.
    #[serde(default = "default_openapi_json_path")]
    pub openapi_json_path: String,

    /// File the generated spec is synced to.
    #[serde(default = "default_spec_output")]
    pub spec_output: PathBuf,

    /// Whether the docs route regenerates the spec file in development.
    #[serde(default = "default_true")]
    pub auto_generate: bool,

    /// Glob patterns of paths to document. `None` documents everything.
    #[serde(default)]
    pub allowed_paths: Option<Vec<String>>,

    /// Glob patterns of paths to leave out of the spec.
    #[serde(default)]
    pub denied_paths: Vec<String>,

    /// Documentation page settings.
    #[serde(default)]
    pub docs: DocsConfig,

    /// Skip the docs URL log line on each docs request.
    #[serde(default)]
    pub suppress_info: bool,

    /// Development or production.
    #[serde(default)]
    pub mode: RuntimeMode,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_openapi_json_path() -> String {
    "/openapi.json".to_string()
}

fn default_spec_output() -> PathBuf {
    PathBuf::from("public/openapi.json")
}

const fn default_true() -> bool {
    true
}

impl Default for HeronConfig {
    fn default() -> Self {
        Self {
            openapi: OpenApi::default(),
            openapi_json_path: default_openapi_json_path(),
            spec_output: default_spec_output(),
            auto_generate: true,
            allowed_paths: None,
            denied_paths: Vec::new(),
            docs: DocsConfig::default(),
            suppress_info: false,
            mode: RuntimeMode::Development,
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl HeronConfig {
    /// Create a development configuration preset.
    ///
    /// ```
    /// use heron_config::HeronConfig;
    ///
    /// let config = HeronConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config
    }

    /// Create a production configuration preset: JSON logs, no spec
    /// generation, no init info.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.mode = RuntimeMode::Production;
        config.auto_generate = false;
        config.suppress_info = true;
        config.logging.format = LogFormat::Json;
        config
    }

    /// The documentation path filter.
    #[must_use]
    pub fn path_filter(&self) -> PathFilter {
        PathFilter {
            allowed: self.allowed_paths.clone(),
            denied: self.denied_paths.clone(),
        }
    }

    /// The documentation page for this configuration.
    #[must_use]
    pub fn docs_page(&self) -> DocsPage {
        let title = self
            .docs
            .title
            .clone()
            .unwrap_or_else(|| self.openapi.info.title.clone());
        let description = self
            .docs
            .description
            .clone()
            .or_else(|| self.openapi.info.description.clone());

        let mut page = DocsPage::new(self.docs.provider, self.openapi_json_path.clone()).title(title);
        if let Some(description) = description {
            page = page.description(description);
        }
        if let Some(favicon) = &self.docs.favicon_url {
            page = page.favicon_url(favicon.clone());
        }
        if let Some(logo) = &self.docs.logo_url {
            page = page.logo_url(logo.clone());
        }
        page
    }

    /// Logging settings for `heron-telemetry`.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.logging.enabled,
            level: self.logging.level.clone(),
            format: self.logging.format,
            ..LogConfig::default()
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The server address is not a socket address
    /// - A URL path does not start with `/`, or the docs and spec paths collide
    /// - A path filter pattern is unusable
    /// - The request timeout is zero
    /// - The log filter does not parse
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        for (field, path) in [
            ("openapi_json_path", &self.openapi_json_path),
            ("server.docs_path", &self.server.docs_path),
        ] {
            if !path.starts_with('/') {
                return Err(ConfigError::invalid_value(field, "must start with '/'"));
            }
        }
        if self.openapi_json_path == self.server.docs_path {
            return Err(ConfigError::invalid_value(
                "openapi_json_path",
                "must differ from server.docs_path",
            ));
        }

        if let Err(pattern) = self.path_filter().validate() {
            return Err(ConfigError::invalid_value(
                "allowed_paths/denied_paths",
                format!("invalid pattern: '{pattern}'"),
            ));
        }

        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_secs",
                "must be greater than zero",
            ));
        }

        if let Err(e) = heron_telemetry::create_env_filter(&self.logging.level) {
            return Err(ConfigError::invalid_value("logging.level", e.to_string()));
        }

        Ok(())
    }
}

/// Documentation page settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DocsConfig {
    /// Renderer.
    #[serde(default)]
    pub provider: DocsProvider,

    /// Page title; defaults to the document title.
    #[serde(default)]
    pub title: Option<String>,

    /// Meta description; defaults to the document description.
    #[serde(default)]
    pub description: Option<String>,

    /// Favicon URL.
    #[serde(default)]
    pub favicon_url: Option<String>,

    /// Logo URL.
    #[serde(default)]
    pub logo_url: Option<String>,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Listen address.
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// URL path of the documentation page.
    #[serde(default = "default_docs_path")]
    pub docs_path: String,

    /// Time allowed to receive a request body.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Largest accepted request body.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_http_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_docs_path() -> String {
    "/api".to_string()
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_max_body_bytes() -> usize {
    1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            docs_path: default_docs_path(),
            request_timeout_secs: default_request_timeout_secs(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Whether to install a subscriber.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// `EnvFilter` directive.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}
