//! Built-in carrier integrations
//!
//! Each carrier module exposes a `plugin` constructor. [`builtin_registry`]
//! registers every carrier the configuration leaves enabled.

use crate::config::{CarrierConfig, Config, TrackingConfig};
use crate::error::RegistrationError;
use crate::plugin::Plugin;
use crate::plugin::registry::{Registry, canonical_carrier};

pub mod braspress;
pub mod correios;
pub mod tracking;

type PluginFactory = fn(&CarrierConfig, &TrackingConfig) -> Result<Plugin, RegistrationError>;

/// Every carrier compiled into this build
pub const BUILTINS: &[(&str, PluginFactory)] = &[
    (correios::NAME, correios::plugin),
    (braspress::NAME, braspress::plugin),
];

/// Build the registry from the compiled-in carriers, honoring `enabled` flags
pub fn builtin_registry(config: &Config) -> Result<Registry, RegistrationError> {
    let mut builder = Registry::builder();

    for (name, factory) in BUILTINS {
        let carrier = config.carrier(name);
        if !carrier.enabled {
            log::info!("Carrier {} disabled in config", name);
            continue;
        }
        builder = builder.register(factory(&carrier, &config.tracking)?)?;
    }

    for key in config.carriers.keys() {
        let known = BUILTINS
            .iter()
            .any(|(name, _)| canonical_carrier(name) == canonical_carrier(key));
        if !known {
            log::warn!("Config mentions carrier '{}' but no implementation is compiled in", key);
        }
    }

    Ok(builder.build())
}
