//! Braspress

use std::sync::Arc;

use super::tracking::{AuthScheme, HttpTrackingClient, TrackingAction, TrackingClient};
use crate::config::{CarrierConfig, TrackingConfig};
use crate::error::RegistrationError;
use crate::plugin::Plugin;

pub const NAME: &str = "Braspress";
pub const DEFAULT_BASE_URL: &str = "https://api.braspress.com/v1/tracking";

pub fn plugin(carrier: &CarrierConfig, tracking: &TrackingConfig) -> Result<Plugin, RegistrationError> {
    let base_url = carrier.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
    let client = HttpTrackingClient::new(
        format!("{}/{{code}}/json", base_url.trim_end_matches('/')),
        AuthScheme::Basic,
    );
    plugin_with_client(Arc::new(client), tracking)
}

pub fn plugin_with_client(client: Arc<dyn TrackingClient>, tracking: &TrackingConfig) -> Result<Plugin, RegistrationError> {
    Plugin::builder(NAME)
        .description("Braspress tracking (encoded credentials in 'token')")
        .action("tracking", TrackingAction::new(client, tracking))
        .build()
}
