//! Carrier registry
//!
//! Maps canonical carrier names to plugins. Built once at startup and read-only
//! afterwards; [`SharedRegistry`] swaps in a whole new registry on reload.

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use std::sync::Arc;

use super::{Plugin, PluginRef};
use crate::error::{DispatchError, RegistrationError};

/// Canonical registry key for a carrier name.
///
/// Surrounding whitespace is trimmed and ASCII letters are lowercased. Every
/// other character is kept as-is, so the mapping is total, idempotent, and
/// independent of locale casing rules.
pub fn canonical_carrier(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Immutable mapping from canonical carrier name to plugin
#[derive(Debug, Default)]
pub struct Registry {
    plugins: IndexMap<String, PluginRef>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Look up a carrier by any casing of its name
    pub fn resolve(&self, name: &str) -> Result<PluginRef, DispatchError> {
        let key = canonical_carrier(name);
        match self.plugins.get(&key) {
            Some(plugin) => {
                log::debug!("Resolved carrier '{}' -> {}", name, plugin.name());
                Ok(Arc::clone(plugin))
            }
            None => {
                log::debug!("No carrier registered for '{}' (key '{}')", name, key);
                Err(DispatchError::PluginNotFound { name: name.to_string() })
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(&canonical_carrier(name))
    }

    /// Registered plugins in registration order
    pub fn plugins(&self) -> impl Iterator<Item = &PluginRef> {
        self.plugins.values()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

/// Collects plugins and rejects canonical-name collisions
#[derive(Default)]
pub struct RegistryBuilder {
    plugins: IndexMap<String, PluginRef>,
}

impl RegistryBuilder {
    pub fn register(mut self, plugin: Plugin) -> Result<Self, RegistrationError> {
        let key = canonical_carrier(plugin.name());
        if key.is_empty() {
            return Err(RegistrationError::EmptyName);
        }
        if self.plugins.contains_key(&key) {
            return Err(RegistrationError::DuplicatePlugin {
                name: plugin.name().to_string(),
            });
        }

        log::debug!(
            "Registering carrier {} with actions [{}]",
            plugin.name(),
            plugin.actions().collect::<Vec<_>>().join(", ")
        );
        self.plugins.insert(key, Arc::new(plugin));
        Ok(self)
    }

    pub fn build(self) -> Registry {
        Registry { plugins: self.plugins }
    }
}

/// Registry handle that can be reloaded atomically while readers keep working
pub struct SharedRegistry {
    current: ArcSwap<Registry>,
}

impl SharedRegistry {
    pub fn new(registry: Registry) -> Self {
        Self {
            current: ArcSwap::from_pointee(registry),
        }
    }

    /// Snapshot of the registry as of now; unaffected by later reloads
    pub fn snapshot(&self) -> Arc<Registry> {
        self.current.load_full()
    }

    pub fn resolve(&self, name: &str) -> Result<PluginRef, DispatchError> {
        self.current.load().resolve(name)
    }

    /// Replace the whole registry in one step
    pub fn reload(&self, registry: Registry) {
        log::info!("Reloading carrier registry ({} carriers)", registry.len());
        self.current.store(Arc::new(registry));
    }
}

impl From<Registry> for SharedRegistry {
    fn from(registry: Registry) -> Self {
        Self::new(registry)
    }
}
