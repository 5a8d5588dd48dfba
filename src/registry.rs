//! Named wiki connection settings.

use std::collections::BTreeMap;

use crate::app::{Result, SyncError};
use crate::domain::WikiConfig;

#[derive(Debug, Clone, Default)]
pub struct WikiRegistry {
    wikis: BTreeMap<String, WikiConfig>,
}

impl WikiRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_configs(configs: impl IntoIterator<Item = WikiConfig>) -> Self {
        let mut registry = Self::new();
        for config in configs {
            registry.register(config);
        }
        registry
    }

    /// Registering a name twice replaces the earlier settings.
    pub fn register(&mut self, config: WikiConfig) {
        tracing::debug!("Registering wiki {} at {}", config.name, config.url);
        self.wikis.insert(config.name.clone(), config);
    }

    pub fn lookup(&self, name: &str) -> Result<&WikiConfig> {
        self.wikis
            .get(name)
            .ok_or_else(|| SyncError::WikiNotFound(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.wikis.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WikiConfig> {
        self.wikis.values()
    }

    pub fn is_empty(&self) -> bool {
        self.wikis.is_empty()
    }
}
