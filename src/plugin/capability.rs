//! Capability checks
//!
//! Verifies a resolved carrier declares an action and hands back a handle bound
//! to that carrier and action.

use std::sync::Arc;

use super::action::Action;
use super::{PluginRef, canonical_action};
use crate::error::DispatchError;

/// Verified carrier + action pair, ready for invocation
#[derive(Clone)]
pub struct ActionHandle {
    plugin: PluginRef,
    action_name: String,
    action: Arc<dyn Action>,
}

impl std::fmt::Debug for ActionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionHandle")
            .field("carrier", &self.plugin.name())
            .field("action", &self.action_name)
            .finish()
    }
}

impl ActionHandle {
    pub fn carrier(&self) -> &str {
        self.plugin.name()
    }

    /// Canonical action name
    pub fn action(&self) -> &str {
        &self.action_name
    }

    pub(crate) fn target(&self) -> &dyn Action {
        self.action.as_ref()
    }
}

/// Check that `plugin` supports `action`
pub fn verify(plugin: &PluginRef, action: &str) -> Result<ActionHandle, DispatchError> {
    let key = canonical_action(action);

    match plugin.action(&key) {
        Some(target) => {
            log::debug!("Verified {}/{}", plugin.name(), key);
            Ok(ActionHandle {
                plugin: Arc::clone(plugin),
                action_name: key,
                action: Arc::clone(target),
            })
        }
        None => {
            log::debug!("{} does not support action '{}'", plugin.name(), action);
            Err(DispatchError::ActionNotSupported {
                carrier: plugin.name().to_string(),
                action: action.to_string(),
            })
        }
    }
}
