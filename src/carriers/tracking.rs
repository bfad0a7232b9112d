//! Reference tracking action
//!
//! Looks up each tracking code upstream and returns one outcome per code, in
//! input order. A failing code is reported in its own slot; its siblings still
//! run.

use chrono::{DateTime, Utc};
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use crate::config::TrackingConfig;
use crate::plugin::action::{Action, ActionContext, ConfigFields, RequestData};

/// Field in the configuration fields holding the carrier credential
pub const TOKEN_FIELD: &str = "token";

/// Placeholder replaced by the tracking code in URL templates
pub const CODE_PLACEHOLDER: &str = "{code}";

/// How the credential is presented to the carrier API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    Bearer,
    /// Token is the pre-encoded credential pair
    Basic,
}

impl AuthScheme {
    pub fn header_value(&self, token: &str) -> String {
        match self {
            AuthScheme::Bearer => format!("Bearer {}", token),
            AuthScheme::Basic => format!("Basic {}", token),
        }
    }
}

/// Single upstream status lookup
///
/// A lookup that has started is bounded by `timeout` only. Cancellation is
/// observed between lookups, so codes not yet started are skipped.
pub trait TrackingClient: Send + Sync {
    /// `timeout` is `None` when neither a per-lookup timeout nor a deadline applies
    fn lookup(&self, code: &str, token: &str, timeout: Option<Duration>) -> Result<serde_json::Value>;
}

/// Tracking lookups over HTTP
#[derive(Debug, Clone)]
pub struct HttpTrackingClient {
    url_template: String,
    auth: AuthScheme,
}

impl HttpTrackingClient {
    /// `url_template` must contain `{code}`
    pub fn new(url_template: impl Into<String>, auth: AuthScheme) -> Self {
        Self {
            url_template: url_template.into(),
            auth,
        }
    }

    pub fn url_for(&self, code: &str) -> String {
        self.url_template.replace(CODE_PLACEHOLDER, code)
    }
}

impl TrackingClient for HttpTrackingClient {
    fn lookup(&self, code: &str, token: &str, timeout: Option<Duration>) -> Result<serde_json::Value> {
        let url = self.url_for(code);
        log::debug!("GET {} (timeout {:?})", url, timeout);

        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(timeout)
            .build()
            .into();

        let mut response = agent
            .get(&url)
            .header("Authorization", &self.auth.header_value(token))
            .header("Accept", "application/json")
            .call()
            .with_context(|| format!("Tracking request failed for {}", code))?;

        let response_body = response
            .body_mut()
            .read_to_string()
            .context("Failed to read tracking response")?;

        serde_json::from_str(&response_body).context("Failed to parse tracking response")
    }
}

/// Outcome for one tracking code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingOutcome {
    pub code: String,
    pub checked_at: DateTime<Utc>,
    #[serde(flatten)]
    pub status: TrackingStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TrackingStatus {
    /// Raw upstream payload
    Ok { result: serde_json::Value },
    Error { error: String },
}

impl TrackingOutcome {
    fn ok(code: &str, result: serde_json::Value) -> Self {
        Self {
            code: code.to_string(),
            checked_at: Utc::now(),
            status: TrackingStatus::Ok { result },
        }
    }

    fn failed(code: &str, error: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            checked_at: Utc::now(),
            status: TrackingStatus::Error { error: error.into() },
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.status, TrackingStatus::Ok { .. })
    }
}

/// The `tracking` action shared by the built-in carriers
pub struct TrackingAction {
    client: Arc<dyn TrackingClient>,
    timeout: Option<Duration>,
    max_concurrency: usize,
}

impl TrackingAction {
    pub fn new(client: Arc<dyn TrackingClient>, config: &TrackingConfig) -> Self {
        Self {
            client,
            timeout: config.timeout(),
            max_concurrency: config.max_concurrency.max(1),
        }
    }

    /// Up to `max_concurrency` workers pull the next code as soon as they are free
    fn lookup_all(&self, ctx: &ActionContext, codes: &[String], token: &str) -> Vec<TrackingOutcome> {
        let next = &AtomicUsize::new(0);
        let workers = self.max_concurrency.min(codes.len());
        let mut slots: Vec<Option<TrackingOutcome>> = vec![None; codes.len()];

        thread::scope(|s| {
            let handles: Vec<_> = (0..workers)
                .map(move |_| {
                    s.spawn(move || {
                        let mut done = Vec::new();
                        loop {
                            let index = next.fetch_add(1, Ordering::Relaxed);
                            let Some(code) = codes.get(index) else { break };
                            let outcome = catch_unwind(AssertUnwindSafe(|| self.lookup_one(ctx, code, token)))
                                .unwrap_or_else(|_| TrackingOutcome::failed(code, "lookup panicked"));
                            done.push((index, outcome));
                        }
                        done
                    })
                })
                .collect();

            for handle in handles {
                match handle.join() {
                    Ok(done) => {
                        for (index, outcome) in done {
                            slots[index] = Some(outcome);
                        }
                    }
                    Err(_) => log::error!("Tracking worker panicked"),
                }
            }
        });

        slots
            .into_iter()
            .zip(codes)
            .map(|(slot, code)| slot.unwrap_or_else(|| TrackingOutcome::failed(code, "lookup panicked")))
            .collect()
    }

    fn lookup_one(&self, ctx: &ActionContext, code: &str, token: &str) -> TrackingOutcome {
        if ctx.is_cancelled() {
            return TrackingOutcome::failed(code, "cancelled");
        }

        let trimmed = code.trim();
        if !is_valid_code(trimmed) {
            return TrackingOutcome::failed(code, "invalid tracking code");
        }
        if ctx.is_expired() {
            return TrackingOutcome::failed(code, "deadline exceeded");
        }

        match self.client.lookup(trimmed, token, ctx.clip(self.timeout)) {
            Ok(result) => TrackingOutcome::ok(code, result),
            Err(e) => {
                log::warn!("Tracking lookup for {} failed: {:#}", trimmed, e);
                TrackingOutcome::failed(code, format!("{:#}", e))
            }
        }
    }
}

impl Action for TrackingAction {
    fn execute(&self, ctx: &ActionContext, data: &RequestData, fields: &ConfigFields) -> Result<serde_json::Value> {
        let codes = parse_codes(data)?;
        if codes.is_empty() {
            return Ok(serde_json::Value::Array(Vec::new()));
        }

        let token = fields
            .get(TOKEN_FIELD)
            .and_then(|v| v.as_str())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| eyre!("Missing required field '{}'", TOKEN_FIELD))?;

        let outcomes = self.lookup_all(ctx, &codes, token);
        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        if failed > 0 {
            log::warn!("{}/{} tracking lookups failed", failed, outcomes.len());
        }

        serde_json::to_value(outcomes).context("Failed to serialize tracking results")
    }
}

/// Extract `codes` from `{"codes": [..]}`, exactly as the caller sent them
pub fn parse_codes(data: &RequestData) -> Result<Vec<String>> {
    let codes = data
        .get("codes")
        .ok_or_else(|| eyre!("Request data must contain a 'codes' array"))?
        .as_array()
        .ok_or_else(|| eyre!("'codes' must be an array"))?;

    codes
        .iter()
        .enumerate()
        .map(|(i, code)| {
            code.as_str()
                .map(str::to_string)
                .ok_or_else(|| eyre!("codes[{}] must be a string", i))
        })
        .collect()
}

/// Tracking codes are non-empty ASCII alphanumerics; anything else never reaches a URL
fn is_valid_code(code: &str) -> bool {
    !code.is_empty() && code.chars().all(|c| c.is_ascii_alphanumeric())
}
