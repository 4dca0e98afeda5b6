//! Integration tests for hook registration and dispatch.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use hookline::{priority, Arguments, HookError, HookManager, HookOptions};
use serde_json::{json, Value};

fn args(pairs: &[(&str, Value)]) -> Arguments {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[test]
fn test_registered_listener_runs() {
    let mut hooks = HookManager::new();
    let called = Arc::new(AtomicUsize::new(0));
    let count = called.clone();

    hooks.on("test.hook", move |_ctx| {
        count.fetch_add(1, Ordering::SeqCst);
    });
    hooks.dispatch("test.hook", Arguments::new()).unwrap();

    assert_eq!(called.load(Ordering::SeqCst), 1);
}

#[test]
fn test_arguments_reach_listeners() {
    let mut hooks = HookManager::new();
    let received = Arc::new(Mutex::new(None));
    let slot = received.clone();

    hooks.on("user.created", move |ctx| {
        *slot.lock().unwrap() = ctx.argument("name").cloned();
    });
    hooks
        .dispatch("user.created", args(&[("name", json!("Alice"))]))
        .unwrap();

    assert_eq!(*received.lock().unwrap(), Some(json!("Alice")));
}

#[test]
fn test_priority_order_beats_registration_order() {
    let mut hooks = HookManager::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    for (tag, priority) in [("second", 20), ("first", 10), ("third", 30)] {
        let log = order.clone();
        hooks
            .on_with("test.priority", priority, HookOptions::default(), move |_ctx| {
                log.lock().unwrap().push(tag);
            })
            .unwrap();
    }
    hooks.dispatch("test.priority", Arguments::new()).unwrap();

    assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
}

#[test]
fn test_equal_priority_preserves_registration_order() {
    let mut hooks = HookManager::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    for tag in ["a", "b", "c"] {
        let log = order.clone();
        hooks.on("test.ties", move |_ctx| log.lock().unwrap().push(tag));
    }
    hooks.dispatch("test.ties", Arguments::new()).unwrap();

    assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
}

#[test]
fn test_negative_priorities_run_before_highest() {
    let mut hooks = HookManager::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    for (tag, prio) in [("highest", priority::HIGHEST), ("earlier", -5)] {
        let log = order.clone();
        hooks
            .on_with("test.negative", prio, HookOptions::default(), move |_ctx| {
                log.lock().unwrap().push(tag);
            })
            .unwrap();
    }
    hooks.dispatch("test.negative", Arguments::new()).unwrap();

    assert_eq!(*order.lock().unwrap(), vec!["earlier", "highest"]);
}

#[test]
fn test_stop_propagation_suppresses_rest_of_chain() {
    let mut hooks = HookManager::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    let log = order.clone();
    hooks
        .on_with("test.stop", priority::HIGH, HookOptions::default(), move |_ctx| {
            log.lock().unwrap().push("before");
        })
        .unwrap();
    let log = order.clone();
    hooks.on("test.stop", move |ctx| {
        log.lock().unwrap().push("stopper");
        ctx.stop_propagation();
    });
    // Same priority, registered later: must not run.
    let log = order.clone();
    hooks.on("test.stop", move |_ctx| log.lock().unwrap().push("same-priority"));
    let log = order.clone();
    hooks
        .on_with("test.stop", priority::LOW, HookOptions::default(), move |_ctx| {
            log.lock().unwrap().push("later-priority");
        })
        .unwrap();

    let ctx = hooks.dispatch("test.stop", Arguments::new()).unwrap();

    assert!(ctx.is_propagation_stopped());
    assert_eq!(*order.lock().unwrap(), vec!["before", "stopper"]);
}

#[test]
fn test_dispatch_returns_context_with_arguments() {
    let hooks = HookManager::new();

    let ctx = hooks
        .dispatch("test.context", args(&[("key", json!("value"))]))
        .unwrap();

    assert_eq!(ctx.hook_name(), "test.context");
    assert_eq!(ctx.argument("key"), Some(&json!("value")));
}

#[test]
fn test_unknown_channel_is_not_an_error_by_default() {
    let hooks = HookManager::new();

    let ctx = hooks.dispatch("non.existent", Arguments::new()).unwrap();

    assert_eq!(ctx.hook_name(), "non.existent");
    assert!(!ctx.is_propagation_stopped());
}

#[test]
fn test_strict_mode_rejects_unknown_channel() {
    let mut hooks = HookManager::new();
    hooks.set_strict_mode(true);

    let err = hooks.dispatch("unknown.event", Arguments::new()).unwrap_err();

    assert!(matches!(err, HookError::NoListeners { ref channel } if channel == "unknown.event"));
    assert_eq!(
        err.to_string(),
        "No listeners found for hook: unknown.event"
    );

    hooks.set_strict_mode(false);
    assert!(hooks.dispatch("unknown.event", Arguments::new()).is_ok());
}

#[test]
fn test_same_callback_registered_twice_runs_twice() {
    let mut hooks = HookManager::new();
    let count = Arc::new(AtomicUsize::new(0));

    for _ in 0..2 {
        let count = count.clone();
        hooks.on("test.multiple", move |_ctx| {
            count.fetch_add(1, Ordering::SeqCst);
        });
    }
    hooks.dispatch("test.multiple", Arguments::new()).unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[test]
fn test_reset_round_trip() {
    let mut hooks = HookManager::new();
    let count = Arc::new(AtomicUsize::new(0));
    let counter = count.clone();

    hooks.on("test.reset", move |_ctx| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    hooks.set_strict_mode(true);
    hooks.dispatch("test.reset", Arguments::new()).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);

    hooks.reset();

    // Registration gone, strict mode gone: behaves as never-registered.
    let ctx = hooks.dispatch("test.reset", Arguments::new()).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(!ctx.is_propagation_stopped());
    assert!(!hooks.strict_mode());
}

#[test]
fn test_listener_panic_propagates_without_sandbox() {
    // The default dispatch path is deliberately uncontained; failure
    // isolation is what Sandbox is for, opted into per call site.
    let mut hooks = HookManager::new();
    hooks.on("test.panic", |_ctx| panic!("listener exploded"));

    let result = catch_unwind(AssertUnwindSafe(|| {
        hooks.dispatch("test.panic", Arguments::new())
    }));

    assert!(result.is_err());
}

#[test]
fn test_log_sink_sees_lifecycle_events() {
    let mut hooks = HookManager::new();
    let events = Arc::new(Mutex::new(Vec::new()));

    let sink_events = events.clone();
    hooks.set_log_sink(move |message, _context| {
        sink_events.lock().unwrap().push(message.to_string());
    });
    hooks.on("test.logged", |ctx| ctx.stop_propagation());

    hooks.dispatch("test.logged", Arguments::new()).unwrap();
    hooks.dispatch("test.silent", Arguments::new()).unwrap();

    let seen = events.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            "hook.dispatching",
            "hook.propagation_stopped",
            "hook.completed",
            "hook.dispatching",
            "hook.no_listeners",
        ]
    );
}

#[test]
fn test_log_sink_receives_channel_in_context() {
    let mut hooks = HookManager::new();
    let contexts = Arc::new(Mutex::new(Vec::new()));

    let sink_contexts = contexts.clone();
    hooks.set_log_sink(move |_message, context| {
        sink_contexts.lock().unwrap().push(context.clone());
    });
    hooks.dispatch("test.meta", Arguments::new()).unwrap();

    let seen = contexts.lock().unwrap();
    assert!(seen.iter().all(|c| c["channel"] == json!("test.meta")));
}
