//! Shared, replaceable configuration.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::HeronConfig;

/// Result of [`ConfigCell::install`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigChange {
    /// The cell was empty.
    Initialized,
    /// The new config equals the installed one; nothing changed.
    Unchanged,
    /// A different config replaced the installed one.
    Replaced,
}

/// Holds the configuration the docs route and server read on each request.
///
/// The cell starts empty. The first [`install`](Self::install) initializes
/// it; installing an identical config is a no-op and installing a
/// different one replaces it and logs the re-initialization. Readers get an
/// `Arc` snapshot, so a replacement never tears a request in flight.
///
/// # Example
///
/// ```
/// use heron_config::{ConfigCell, ConfigChange, HeronConfig};
///
/// let cell = ConfigCell::new();
/// assert_eq!(cell.install(HeronConfig::default()), ConfigChange::Initialized);
/// assert_eq!(cell.install(HeronConfig::default()), ConfigChange::Unchanged);
/// assert_eq!(cell.install(HeronConfig::production()), ConfigChange::Replaced);
/// ```
#[derive(Debug, Default)]
pub struct ConfigCell {
    inner: RwLock<Option<Arc<HeronConfig>>>,
}

impl ConfigCell {
    /// Creates an empty cell.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cell holding `config`.
    #[must_use]
    pub fn with_config(config: HeronConfig) -> Self {
        Self {
            inner: RwLock::new(Some(Arc::new(config))),
        }
    }

    /// Installs `config`, replacing any different config already held.
    pub fn install(&self, config: HeronConfig) -> ConfigChange {
        let mut slot = self.inner.write();
        match slot.as_deref() {
            None => {
                *slot = Some(Arc::new(config));
                ConfigChange::Initialized
            }
            Some(current) if *current == config => ConfigChange::Unchanged,
            Some(_) => {
                tracing::info!("config changed, re-initializing");
                *slot = Some(Arc::new(config));
                ConfigChange::Replaced
            }
        }
    }

    /// The installed config, if any.
    pub fn get(&self) -> Option<Arc<HeronConfig>> {
        self.inner.read().clone()
    }

    /// The installed config, installing the default first if the cell is
    /// empty.
    pub fn current(&self) -> Arc<HeronConfig> {
        if let Some(config) = self.get() {
            return config;
        }
        let mut slot = self.inner.write();
        slot.get_or_insert_with(|| Arc::new(HeronConfig::default()))
            .clone()
    }
}
