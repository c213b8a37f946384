//! Plugin-based component registry
//!
//! The registry allows outcome sources and standings stores to be registered
//! dynamically at runtime, avoiding hardcoded if-else chains in the daemon.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use standings_core::registry::ComponentRegistry;
//! use standings_core::config::StoreConfig;
//!
//! // Create a registry
//! let registry = ComponentRegistry::new();
//!
//! // Register components
//! registry.register_store("memory", Box::new(MemoryStandingsStoreFactory));
//!
//! // Create a store from config
//! let store = registry.create_store(&StoreConfig::Memory).await?;
//! ```
//!
//! ## Registration
//!
//! Implementations should register themselves during initialization:
//!
//! ```rust,ignore
//! // In standings-source-jsonl crate
//! pub fn register(registry: &ComponentRegistry) {
//!     registry.register_source("jsonl", Box::new(JsonlFactory));
//! }
//! ```

use std::collections::HashMap;
use std::sync::RwLock;

use crate::config::{OutcomeSourceConfig, StoreConfig};
use crate::error::{Error, Result};
use crate::traits::{OutcomeSource, OutcomeSourceFactory, StandingsStore, StandingsStoreFactory};

/// Registry for plugin-based component creation
///
/// The registry maintains maps of type names to factory objects, allowing
/// dynamic instantiation of outcome sources and standings stores based on
/// configuration.
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ComponentRegistry {
    /// Registered outcome source factories
    sources: RwLock<HashMap<String, Box<dyn OutcomeSourceFactory>>>,

    /// Registered standings store factories
    stores: RwLock<HashMap<String, std::sync::Arc<dyn StandingsStoreFactory>>>,
}

impl ComponentRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in store factories registered
    pub fn with_builtin_stores() -> Self {
        let registry = Self::new();
        registry.register_store(
            "memory",
            Box::new(crate::store::MemoryStandingsStoreFactory),
        );
        registry.register_store("file", Box::new(crate::store::FileStandingsStoreFactory));
        registry
    }

    /// Register an outcome source factory
    ///
    /// # Parameters
    ///
    /// - `name`: Source type name (e.g., "jsonl")
    /// - `factory`: Factory object for creating source instances
    pub fn register_source(&self, name: impl Into<String>, factory: Box<dyn OutcomeSourceFactory>) {
        let name = name.into();
        let mut sources = self.sources.write().unwrap();
        sources.insert(name, factory);
    }

    /// Register a standings store factory
    ///
    /// # Parameters
    ///
    /// - `name`: Store type name (e.g., "file", "memory")
    /// - `factory`: Factory object for creating store instances
    pub fn register_store(&self, name: impl Into<String>, factory: Box<dyn StandingsStoreFactory>) {
        let name = name.into();
        let mut stores = self.stores.write().unwrap();
        stores.insert(name, std::sync::Arc::from(factory));
    }

    /// Create an outcome source from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn OutcomeSource>)`: Created source instance
    /// - `Err(Error)`: If the source type is not registered or creation fails
    pub fn create_source(&self, config: &OutcomeSourceConfig) -> Result<Box<dyn OutcomeSource>> {
        let source_type = config.type_name();
        let sources = self.sources.read().unwrap();

        let factory = sources
            .get(source_type)
            .ok_or_else(|| Error::config(format!("Unknown outcome source type: {}", source_type)))?;

        factory.create(config)
    }

    /// Create a standings store from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn StandingsStore>)`: Created store instance
    /// - `Err(Error)`: If the store type is not registered or creation fails
    pub async fn create_store(&self, config: &StoreConfig) -> Result<Box<dyn StandingsStore>> {
        let store_type = match config {
            StoreConfig::File { .. } => "file",
            StoreConfig::Memory => "memory",
            StoreConfig::Custom { factory, .. } => factory,
        };

        let factory = {
            let stores = self.stores.read().unwrap();
            stores
                .get(store_type)
                .ok_or_else(|| Error::config(format!("Unknown store type: {}", store_type)))?
                .clone()
            // Lock released before the async create
        };

        let config_json = serde_json::to_value(config)?;
        factory.create(&config_json).await
    }

    /// List all registered outcome source types
    pub fn list_sources(&self) -> Vec<String> {
        let sources = self.sources.read().unwrap();
        sources.keys().cloned().collect()
    }

    /// List all registered store types
    pub fn list_stores(&self) -> Vec<String> {
        let stores = self.stores.read().unwrap();
        stores.keys().cloned().collect()
    }

    /// Check if an outcome source type is registered
    pub fn has_source(&self, name: &str) -> bool {
        let sources = self.sources.read().unwrap();
        sources.contains_key(name)
    }

    /// Check if a store type is registered
    pub fn has_store(&self, name: &str) -> bool {
        let stores = self.stores.read().unwrap();
        stores.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockSourceFactory;

    impl OutcomeSourceFactory for MockSourceFactory {
        fn create(&self, _config: &OutcomeSourceConfig) -> Result<Box<dyn OutcomeSource>> {
            Err(Error::not_found("Mock source not implemented"))
        }
    }

    #[test]
    fn test_registry_registration() {
        let registry = ComponentRegistry::new();

        // Initially empty
        assert!(!registry.has_source("mock"));

        registry.register_source("mock", Box::new(MockSourceFactory));

        assert!(registry.has_source("mock"));
        assert!(registry.list_sources().contains(&"mock".to_string()));
    }

    #[tokio::test]
    async fn test_builtin_stores() {
        let registry = ComponentRegistry::with_builtin_stores();

        assert!(registry.has_store("memory"));
        assert!(registry.has_store("file"));

        let store = registry.create_store(&StoreConfig::Memory).await;
        assert!(store.is_ok());

        let unknown = registry
            .create_store(&StoreConfig::Custom {
                factory: "does-not-exist".to_string(),
                config: serde_json::json!({}),
            })
            .await;
        assert!(unknown.is_err());
    }
}
