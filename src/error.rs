//! Error types for carrier resolution, capability checks, and action dispatch.

use thiserror::Error;

/// Boxed cause carried by an action failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Pipeline stage a request failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolve,
    Verify,
    Invoke,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Resolve => write!(f, "resolve"),
            Stage::Verify => write!(f, "verify"),
            Stage::Invoke => write!(f, "invoke"),
        }
    }
}

/// Request-time failures surfaced to callers of the dispatch pipeline.
///
/// The set is closed: every resolve, verify, or invoke call either succeeds
/// or returns exactly one of these.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No carrier is registered under the requested name.
    #[error("carrier not implemented: {name}")]
    PluginNotFound { name: String },

    /// The carrier exists but does not implement the requested action.
    #[error("action not supported by {carrier}: {action}")]
    ActionNotSupported { carrier: String, action: String },

    /// The action ran and failed.
    #[error("{carrier}/{action} failed")]
    ActionExecution {
        carrier: String,
        action: String,
        #[source]
        source: BoxError,
    },
}

impl DispatchError {
    /// The stage this error was raised from.
    pub fn stage(&self) -> Stage {
        match self {
            DispatchError::PluginNotFound { .. } => Stage::Resolve,
            DispatchError::ActionNotSupported { .. } => Stage::Verify,
            DispatchError::ActionExecution { .. } => Stage::Invoke,
        }
    }

    /// Process exit code used by the CLI for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self.stage() {
            Stage::Resolve => 2,
            Stage::Verify => 3,
            Stage::Invoke => 4,
        }
    }
}

/// Failures while building plugins or the registry at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("carrier name must not be empty")]
    EmptyName,

    #[error("carrier already registered: {name}")]
    DuplicatePlugin { name: String },

    #[error("carrier {plugin} declares an action with an empty name")]
    EmptyActionName { plugin: String },

    #[error("carrier {plugin} declares action {action} more than once")]
    DuplicateAction { plugin: String, action: String },
}
