//! Carrier plugins and the resolve -> verify -> invoke pipeline
//!
//! This module handles:
//! - Declaring plugins and their action tables
//! - Registering plugins under canonical carrier names
//! - Checking that a carrier supports an action
//! - Invoking verified actions

use indexmap::IndexMap;
use std::sync::Arc;

pub mod action;
pub mod capability;
pub mod dispatch;
pub mod registry;

use crate::error::RegistrationError;
use action::Action;

/// Shared reference to a registered plugin
pub type PluginRef = Arc<Plugin>;

/// Canonical form of an action name: surrounding whitespace trimmed, ASCII lowercased.
pub fn canonical_action(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// A carrier integration: a display name plus an immutable table of actions
pub struct Plugin {
    name: String,
    description: String,
    actions: IndexMap<String, Arc<dyn Action>>,
}

impl std::fmt::Debug for Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Plugin {
    pub fn builder(name: impl Into<String>) -> PluginBuilder {
        PluginBuilder {
            name: name.into(),
            description: String::new(),
            actions: Vec::new(),
        }
    }

    /// Display name as registered (e.g. "Correios")
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Declared action names, in declaration order
    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    /// Whether the plugin declares `action` (any casing)
    pub fn supports(&self, action: &str) -> bool {
        self.actions.contains_key(&canonical_action(action))
    }

    pub(crate) fn action(&self, canonical: &str) -> Option<&Arc<dyn Action>> {
        self.actions.get(canonical)
    }
}

/// Builder collecting a plugin's action table before it is frozen
pub struct PluginBuilder {
    name: String,
    description: String,
    actions: Vec<(String, Arc<dyn Action>)>,
}

impl PluginBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn action(mut self, name: &str, action: impl Action + 'static) -> Self {
        self.actions.push((name.to_string(), Arc::new(action)));
        self
    }

    pub fn build(self) -> Result<Plugin, RegistrationError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(RegistrationError::EmptyName);
        }

        let mut actions = IndexMap::with_capacity(self.actions.len());
        for (action_name, action) in self.actions {
            let key = canonical_action(&action_name);
            if key.is_empty() {
                return Err(RegistrationError::EmptyActionName { plugin: name });
            }
            if actions.contains_key(&key) {
                return Err(RegistrationError::DuplicateAction { plugin: name, action: key });
            }
            actions.insert(key, action);
        }

        Ok(Plugin {
            name,
            description: self.description,
            actions,
        })
    }
}
