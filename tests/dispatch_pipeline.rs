//! Integration tests for the resolve -> verify -> invoke pipeline
//!
//! These tests drive the library the way a web layer would:
//! - Resolving carriers by any casing
//! - Verifying supported and unsupported actions
//! - Invoking tracking and checking order preservation
//! - Reloading the registry while holding snapshots

use std::sync::{Arc, Mutex};
use std::time::Duration;

use carrier_dispatch::carriers::tracking::{TrackingClient, TrackingOutcome, TrackingStatus};
use carrier_dispatch::carriers::{braspress, correios};
use carrier_dispatch::config::TrackingConfig;
use carrier_dispatch::{DispatchError, Dispatcher, Registry, Stage, invoke, verify};
use serde_json::json;

/// Upstream stand-in: echoes the code back, fails codes listed in `broken`
struct FakeUpstream {
    broken: Vec<&'static str>,
    tokens: Mutex<Vec<String>>,
}

impl FakeUpstream {
    fn new(broken: &[&'static str]) -> Arc<Self> {
        Arc::new(Self {
            broken: broken.to_vec(),
            tokens: Mutex::new(Vec::new()),
        })
    }
}

impl TrackingClient for FakeUpstream {
    fn lookup(&self, code: &str, token: &str, _timeout: Option<Duration>) -> eyre::Result<serde_json::Value> {
        self.tokens.lock().unwrap().push(token.to_string());
        if self.broken.iter().any(|b| *b == code) {
            eyre::bail!("upstream timeout for {}", code);
        }
        Ok(json!({ "codObjeto": code, "eventos": [{ "descricao": "Objeto entregue" }] }))
    }
}

fn registry(upstream: Arc<FakeUpstream>) -> Registry {
    let tracking = TrackingConfig::default();
    Registry::builder()
        .register(correios::plugin_with_client(upstream.clone(), &tracking).unwrap())
        .unwrap()
        .register(braspress::plugin_with_client(upstream, &tracking).unwrap())
        .unwrap()
        .build()
}

fn outcomes(value: serde_json::Value) -> Vec<TrackingOutcome> {
    serde_json::from_value(value).expect("tracking result is a list of outcomes")
}

#[test]
fn test_scenario_a_track_two_codes() {
    let upstream = FakeUpstream::new(&[]);
    let registry = registry(upstream.clone());

    let plugin = registry.resolve("correios").expect("Correios registered");
    let handle = verify(&plugin, "tracking").expect("Correios supports tracking");
    let result = invoke(&handle, &json!({"codes": ["1", "2"]}), &json!({"token": "T"})).expect("tracking succeeds");

    let out = outcomes(result);
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].code, "1");
    assert_eq!(out[1].code, "2");
    match &out[1].status {
        TrackingStatus::Ok { result } => assert_eq!(result["codObjeto"], "2"),
        other => panic!("expected ok outcome, got {:?}", other),
    }
    assert_eq!(*upstream.tokens.lock().unwrap(), vec!["T", "T"]);
}

#[test]
fn test_scenario_b_unsupported_action() {
    let registry = registry(FakeUpstream::new(&[]));

    let plugin = registry.resolve("correios").unwrap();
    let err = verify(&plugin, "solicitation").unwrap_err();

    assert!(matches!(
        &err,
        DispatchError::ActionNotSupported { action, .. } if action == "solicitation"
    ));
    assert_eq!(err.stage(), Stage::Verify);
}

#[test]
fn test_scenario_c_unknown_carrier() {
    let upstream = FakeUpstream::new(&[]);
    let dispatcher = Dispatcher::new(registry(upstream.clone()));

    let err = dispatcher
        .dispatch("kangu", "tracking", &json!({"codes": ["1"]}), &json!({"token": "T"}))
        .unwrap_err();

    assert!(matches!(&err, DispatchError::PluginNotFound { name } if name == "kangu"));
    assert!(err.to_string().contains("kangu"));
    assert!(upstream.tokens.lock().unwrap().is_empty(), "no invocation after resolve failure");
}

#[test]
fn test_every_casing_resolves_to_same_plugin() {
    let registry = registry(FakeUpstream::new(&[]));

    let canonical = registry.resolve("Correios").unwrap();
    for name in ["correios", "CORREIOS", "Correios", "  cOrReIoS  "] {
        assert!(Arc::ptr_eq(&canonical, &registry.resolve(name).unwrap()), "{name}");
    }
}

#[test]
fn test_partial_failure_keeps_positions() {
    let dispatcher = Dispatcher::new(registry(FakeUpstream::new(&["B2"])));

    let result = dispatcher
        .dispatch(
            "Braspress",
            "TRACKING",
            &json!({"codes": ["A1", "B2", "C3", "D4", "E5"]}),
            &json!({"token": "dXNlcjpwYXNz"}),
        )
        .unwrap();

    let out = outcomes(result);
    let codes: Vec<_> = out.iter().map(|o| o.code.as_str()).collect();
    assert_eq!(codes, vec!["A1", "B2", "C3", "D4", "E5"]);

    let ok: Vec<bool> = out.iter().map(TrackingOutcome::is_ok).collect();
    assert_eq!(ok, vec![true, false, true, true, true]);
}

#[test]
fn test_missing_token_is_execution_error() {
    let dispatcher = Dispatcher::new(registry(FakeUpstream::new(&[])));

    let err = dispatcher
        .dispatch("correios", "tracking", &json!({"codes": ["1"]}), &json!({}))
        .unwrap_err();

    assert_eq!(err.stage(), Stage::Invoke);
    assert_eq!(err.exit_code(), 4);
}

#[test]
fn test_lookups_do_not_mutate_registry() {
    let dispatcher = Dispatcher::new(registry(FakeUpstream::new(&[])));

    for _ in 0..5 {
        assert!(dispatcher.handle("correios", "tracking").is_ok());
        assert!(dispatcher.handle("correios", "quote").is_err());
        assert!(dispatcher.handle("kangu", "tracking").is_err());
    }

    let snapshot = dispatcher.registry().snapshot();
    assert_eq!(snapshot.len(), 2);
}

#[test]
fn test_reload_while_dispatching() {
    let dispatcher = Dispatcher::new(registry(FakeUpstream::new(&[])));
    let before = dispatcher.registry().snapshot();

    let tracking = TrackingConfig::default();
    let only_braspress = Registry::builder()
        .register(braspress::plugin_with_client(FakeUpstream::new(&[]), &tracking).unwrap())
        .unwrap()
        .build();
    dispatcher.registry().reload(only_braspress);

    assert!(matches!(
        dispatcher.handle("correios", "tracking"),
        Err(DispatchError::PluginNotFound { .. })
    ));
    assert!(dispatcher.handle("braspress", "tracking").is_ok());
    assert!(before.resolve("correios").is_ok());
}
