//! Action contract
//!
//! Every carrier operation implements [`Action`]. The dispatcher passes request
//! data and configuration fields through unchanged; validating their shape is
//! the action's job.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Domain payload for an action (e.g. `{"codes": ["AA123456789BR"]}`)
pub type RequestData = serde_json::Value;

/// Carrier-specific settings for an action (e.g. `{"token": "..."}`)
pub type ConfigFields = serde_json::Value;

/// Action contract interface
pub trait Action: Send + Sync {
    /// Run the action. Side effects (network calls) are allowed here and only here.
    fn execute(&self, ctx: &ActionContext, data: &RequestData, fields: &ConfigFields) -> eyre::Result<serde_json::Value>;
}

impl<F> Action for F
where
    F: Fn(&ActionContext, &RequestData, &ConfigFields) -> eyre::Result<serde_json::Value> + Send + Sync,
{
    fn execute(&self, ctx: &ActionContext, data: &RequestData, fields: &ConfigFields) -> eyre::Result<serde_json::Value> {
        self(ctx, data, fields)
    }
}

/// Shared cancellation flag, cloned from the caller into running actions
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Per-invocation context: cancellation and an optional deadline
#[derive(Debug, Clone, Default)]
pub struct ActionContext {
    cancel: CancelToken,
    deadline: Option<Instant>,
}

impl ActionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Time left before the deadline; `None` when no deadline is set
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_some_and(|r| r.is_zero())
    }

    /// Clip an optional per-call timeout to whatever remains of the deadline
    pub fn clip(&self, timeout: Option<Duration>) -> Option<Duration> {
        match (timeout, self.remaining()) {
            (Some(timeout), Some(remaining)) => Some(timeout.min(remaining)),
            (timeout, remaining) => timeout.or(remaining),
        }
    }
}
