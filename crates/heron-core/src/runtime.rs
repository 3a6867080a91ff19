//! Runtime mode and the internal introspection agent.

use serde::{Deserialize, Serialize};

/// Environment variable selecting the runtime mode.
pub const RUNTIME_MODE_ENV: &str = "HERON_ENV";

/// `user-agent` used by the docs route to ask routes for their OpenAPI
/// fragment. Routes answer it outside production only; the docs route
/// itself rejects it.
pub const INTERNAL_USER_AGENT: &str = "heron-introspect";

/// Development or production.
///
/// Introspection and spec generation only happen in development.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    /// Introspection enabled.
    #[default]
    Development,
    /// Introspection disabled.
    Production,
}

impl RuntimeMode {
    /// Reads [`RUNTIME_MODE_ENV`]; `production` (any case) selects
    /// production, anything else development.
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var(RUNTIME_MODE_ENV)
            .map(|v| Self::parse(&v))
            .unwrap_or_default()
    }

    /// Parses a mode name, defaulting to development.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("production") {
            Self::Production
        } else {
            Self::Development
        }
    }

    /// Whether this is production.
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}
