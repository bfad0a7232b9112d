//! Carrier integration registry and capability dispatcher.
//!
//! A caller names a carrier and an action; the registry resolves the carrier,
//! the capability check confirms the action exists, and the dispatcher invokes
//! it with request data and carrier configuration fields.
//!
//! ```no_run
//! use carrier_dispatch::{Config, Dispatcher, carriers};
//! use serde_json::json;
//!
//! let registry = carriers::builtin_registry(&Config::default())?;
//! let dispatcher = Dispatcher::new(registry);
//! let _results = dispatcher.dispatch(
//!     "correios",
//!     "tracking",
//!     &json!({"codes": ["AA123456789BR"]}),
//!     &json!({"token": "secret"}),
//! )?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod carriers;
pub mod config;
pub mod error;
pub mod plugin;

pub use config::Config;
pub use error::{DispatchError, RegistrationError, Stage};
pub use plugin::action::{Action, ActionContext, CancelToken, ConfigFields, RequestData};
pub use plugin::capability::{ActionHandle, verify};
pub use plugin::dispatch::{Dispatcher, invoke, invoke_with};
pub use plugin::registry::{Registry, SharedRegistry, canonical_carrier};
pub use plugin::{Plugin, PluginRef, canonical_action};
