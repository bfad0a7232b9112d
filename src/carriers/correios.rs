//! Correios (Brazilian postal service)

use std::sync::Arc;

use super::tracking::{AuthScheme, HttpTrackingClient, TrackingAction, TrackingClient};
use crate::config::{CarrierConfig, TrackingConfig};
use crate::error::RegistrationError;
use crate::plugin::Plugin;

pub const NAME: &str = "Correios";
pub const DEFAULT_BASE_URL: &str = "https://api.correios.com.br/srorastro/v1/objetos";

pub fn plugin(carrier: &CarrierConfig, tracking: &TrackingConfig) -> Result<Plugin, RegistrationError> {
    let base_url = carrier.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
    let client = HttpTrackingClient::new(
        format!("{}/{{code}}?resultado=T", base_url.trim_end_matches('/')),
        AuthScheme::Bearer,
    );
    plugin_with_client(Arc::new(client), tracking)
}

pub fn plugin_with_client(client: Arc<dyn TrackingClient>, tracking: &TrackingConfig) -> Result<Plugin, RegistrationError> {
    Plugin::builder(NAME)
        .description("Correios SRO tracking (bearer token in 'token')")
        .action("tracking", TrackingAction::new(client, tracking))
        .build()
}
