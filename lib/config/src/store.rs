//! Layered configuration store.
//!
//! Lookups resolve in this order:
//!
//! 1. Values set explicitly with [`ConfigStore::set`]
//! 2. The loaded source (environment variables, via the `config` crate)
//! 3. Defaults registered by connectors through [`ConfigProvider::set_default`]
//!
//! Keys are case-insensitive. The environment source lowercases every key it
//! reads, so every layer stores and looks up lowercased keys.

use crate::error::ConfigError;
use crate::provider::ConfigProvider;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// Prefix for environment variables read by [`ConfigStore::from_env`].
///
/// `COURIER_SMS__ACCOUNT_SID` resolves the key `sms.account_sid`.
pub const ENV_PREFIX: &str = "COURIER";

fn normalize(key: &str) -> String {
    key.to_ascii_lowercase()
}

/// A layered key-value configuration store.
#[derive(Debug, Default)]
pub struct ConfigStore {
    overrides: RwLock<HashMap<String, String>>,
    source: Option<config::Config>,
    defaults: RwLock<HashMap<String, String>>,
}

impl ConfigStore {
    /// Creates an empty store with no loaded source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store backed by an already-built `config::Config`.
    #[must_use]
    pub fn with_source(source: config::Config) -> Self {
        Self {
            source: Some(source),
            ..Self::default()
        }
    }

    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment source cannot be built.
    pub fn from_env() -> courier_core::Result<Self, ConfigError> {
        Self::from_environment(None)
    }

    /// Loads configuration from `env`, or the process environment if `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment source cannot be built.
    pub fn from_environment(
        env: Option<config::Map<String, String>>,
    ) -> courier_core::Result<Self, ConfigError> {
        let source = config::Config::builder()
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .source(env),
            )
            .build()
            .map_err(ConfigError::from)?;
        debug!(prefix = ENV_PREFIX, "loaded configuration from environment");
        Ok(Self::with_source(source))
    }

    /// Sets a value that takes precedence over every other layer.
    pub fn set(&self, key: &str, value: impl Into<String>) {
        self.overrides
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(normalize(key), value.into());
    }

    /// Returns the loaded source, for deserializing typed sections.
    #[must_use]
    pub fn source(&self) -> Option<&config::Config> {
        self.source.as_ref()
    }

    /// Returns the registered default for `key`, ignoring other layers.
    #[must_use]
    pub fn default_for(&self, key: &str) -> Option<String> {
        self.defaults
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&normalize(key))
            .cloned()
    }
}

impl ConfigProvider for ConfigStore {
    fn get_string(&self, key: &str) -> Option<String> {
        let key = normalize(key);
        if let Some(value) = self
            .overrides
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Some(value.clone());
        }

        if let Some(value) = self
            .source
            .as_ref()
            .and_then(|source| source.get_string(&key).ok())
        {
            return Some(value);
        }

        self.default_for(&key)
    }

    fn set_default(&self, key: &str, value: &str) {
        self.defaults
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(normalize(key), value.to_string());
    }
}
