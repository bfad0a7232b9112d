//! Action dispatch
//!
//! Invokes verified action handles and wraps every failure into
//! [`DispatchError::ActionExecution`].

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;

use thiserror::Error;

use super::action::{ActionContext, ConfigFields, RequestData};
use super::capability::{ActionHandle, verify};
use super::registry::SharedRegistry;
use crate::error::{BoxError, DispatchError};

/// Reasons an invocation stopped without the action reporting an error itself
#[derive(Debug, Error)]
pub enum InvokeAbort {
    #[error("cancelled before the action started")]
    Cancelled,

    #[error("deadline exceeded before the action started")]
    DeadlineExceeded,

    #[error("action panicked: {0}")]
    Panicked(String),
}

/// Invoke a verified action with no deadline and a fresh cancellation token
pub fn invoke(handle: &ActionHandle, data: &RequestData, fields: &ConfigFields) -> Result<serde_json::Value, DispatchError> {
    invoke_with(handle, data, fields, &ActionContext::new())
}

/// Invoke a verified action under the caller's context
pub fn invoke_with(
    handle: &ActionHandle,
    data: &RequestData,
    fields: &ConfigFields,
    ctx: &ActionContext,
) -> Result<serde_json::Value, DispatchError> {
    if ctx.is_cancelled() {
        return Err(execution_error(handle, InvokeAbort::Cancelled.into()));
    }
    if ctx.is_expired() {
        return Err(execution_error(handle, InvokeAbort::DeadlineExceeded.into()));
    }

    log::info!("Invoking {}/{}", handle.carrier(), handle.action());
    let started = Instant::now();

    let outcome = catch_unwind(AssertUnwindSafe(|| handle.target().execute(ctx, data, fields)));

    match outcome {
        Ok(Ok(value)) => {
            log::info!(
                "{}/{} succeeded in {}ms",
                handle.carrier(),
                handle.action(),
                started.elapsed().as_millis()
            );
            Ok(value)
        }
        Ok(Err(report)) => {
            log::error!("{}/{} failed: {:#}", handle.carrier(), handle.action(), report);
            Err(execution_error(handle, report.into()))
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            log::error!("{}/{} panicked: {}", handle.carrier(), handle.action(), message);
            Err(execution_error(handle, InvokeAbort::Panicked(message).into()))
        }
    }
}

fn execution_error(handle: &ActionHandle, source: BoxError) -> DispatchError {
    DispatchError::ActionExecution {
        carrier: handle.carrier().to_string(),
        action: handle.action().to_string(),
        source,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Runs the full resolve -> verify -> invoke pipeline against a shared registry
pub struct Dispatcher {
    registry: SharedRegistry,
}

impl Dispatcher {
    pub fn new(registry: impl Into<SharedRegistry>) -> Self {
        Self {
            registry: registry.into(),
        }
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Resolve and verify without invoking
    pub fn handle(&self, carrier: &str, action: &str) -> Result<ActionHandle, DispatchError> {
        let plugin = self.registry.resolve(carrier)?;
        verify(&plugin, action)
    }

    pub fn dispatch(
        &self,
        carrier: &str,
        action: &str,
        data: &RequestData,
        fields: &ConfigFields,
    ) -> Result<serde_json::Value, DispatchError> {
        self.dispatch_with(carrier, action, data, fields, &ActionContext::new())
    }

    pub fn dispatch_with(
        &self,
        carrier: &str,
        action: &str,
        data: &RequestData,
        fields: &ConfigFields,
        ctx: &ActionContext,
    ) -> Result<serde_json::Value, DispatchError> {
        let handle = self.handle(carrier, action)?;
        invoke_with(&handle, data, fields, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::Plugin;
    use crate::plugin::action::CancelToken;
    use crate::plugin::registry::Registry;
    use serde_json::json;
    use std::error::Error as _;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn echo(_: &ActionContext, data: &RequestData, fields: &ConfigFields) -> eyre::Result<serde_json::Value> {
        Ok(json!({"data": data, "fields": fields}))
    }

    fn fail(_: &ActionContext, _: &RequestData, _: &ConfigFields) -> eyre::Result<serde_json::Value> {
        eyre::bail!("upstream returned 503")
    }

    fn boom(_: &ActionContext, _: &RequestData, _: &ConfigFields) -> eyre::Result<serde_json::Value> {
        panic!("carrier blew up")
    }

    fn dispatcher() -> Dispatcher {
        let plugin = Plugin::builder("Correios")
            .action("echo", echo)
            .action("fail", fail)
            .action("boom", boom)
            .build()
            .unwrap();
        Dispatcher::new(Registry::builder().register(plugin).unwrap().build())
    }

    #[test]
    fn test_invoke_passes_inputs_through() {
        let dispatcher = dispatcher();
        let handle = dispatcher.handle("correios", "echo").unwrap();

        let data = json!({"codes": ["1", "2"]});
        let fields = json!({"token": "T"});
        let out = invoke(&handle, &data, &fields).unwrap();

        assert_eq!(out, json!({"data": data, "fields": fields}));
    }

    #[test]
    fn test_action_error_wrapped_with_cause() {
        let err = dispatcher()
            .dispatch("correios", "fail", &json!({}), &json!({}))
            .unwrap_err();

        match &err {
            DispatchError::ActionExecution { carrier, action, .. } => {
                assert_eq!(carrier, "Correios");
                assert_eq!(action, "fail");
            }
            other => panic!("expected ActionExecution, got {:?}", other),
        }
        assert!(err.source().unwrap().to_string().contains("503"));
    }

    #[test]
    fn test_panic_becomes_execution_error() {
        let err = dispatcher()
            .dispatch("correios", "boom", &json!({}), &json!({}))
            .unwrap_err();

        assert!(matches!(err, DispatchError::ActionExecution { .. }));
        assert!(err.source().unwrap().to_string().contains("carrier blew up"));
    }

    #[test]
    fn test_cancelled_context_skips_action() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let plugin = Plugin::builder("Correios")
            .action("tracking", move |_: &ActionContext, _: &RequestData, _: &ConfigFields| -> eyre::Result<serde_json::Value> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(serde_json::Value::Null)
            })
            .build()
            .unwrap();
        let dispatcher = Dispatcher::new(Registry::builder().register(plugin).unwrap().build());

        let token = CancelToken::new();
        token.cancel();
        let ctx = ActionContext::new().with_cancel(token);

        let err = dispatcher
            .dispatch_with("correios", "tracking", &json!({}), &json!({}), &ctx)
            .unwrap_err();

        assert!(matches!(err, DispatchError::ActionExecution { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_expired_deadline_skips_action() {
        let ctx = ActionContext::new().with_deadline(Instant::now());
        std::thread::sleep(std::time::Duration::from_millis(2));

        let err = dispatcher()
            .dispatch_with("correios", "echo", &json!({}), &json!({}), &ctx)
            .unwrap_err();

        assert!(err.source().unwrap().to_string().contains("deadline"));
    }

    #[test]
    fn test_pipeline_stops_at_first_failure() {
        let dispatcher = dispatcher();

        let err = dispatcher.dispatch("kangu", "echo", &json!({}), &json!({})).unwrap_err();
        assert!(matches!(err, DispatchError::PluginNotFound { .. }));

        let err = dispatcher
            .dispatch("correios", "solicitation", &json!({}), &json!({}))
            .unwrap_err();
        assert!(matches!(err, DispatchError::ActionNotSupported { .. }));
    }
}
