//! Integration tests for filter chains.

use std::sync::{Arc, Mutex};

use hookline::HookManager;
use serde_json::json;

#[test]
fn test_filter_modifies_value() {
    let mut hooks = HookManager::new();
    hooks.add_filter("content.render", |value, _extras| {
        json!(format!("{} - Modified", value.as_str().unwrap_or_default()))
    });

    let result = hooks.apply_filters("content.render", json!("Original"), &[]);

    assert_eq!(result, json!("Original - Modified"));
}

#[test]
fn test_filters_chain_in_registration_order() {
    let mut hooks = HookManager::new();
    hooks.add_filter("text.transform", |value, _extras| {
        json!(value.as_str().unwrap_or_default().to_uppercase())
    });
    hooks.add_filter_with("text.transform", 20, |value, _extras| {
        json!(format!("{}!", value.as_str().unwrap_or_default()))
    });

    let result = hooks.apply_filters("text.transform", json!("hello"), &[]);

    assert_eq!(result, json!("HELLO!"));
}

#[test]
fn test_filter_priority_is_order_sensitive() {
    let mut hooks = HookManager::new();
    // Registered out of order: the multiplication is registered first
    // but must run second.
    hooks.add_filter_with("number.modify", 20, |value, _extras| {
        json!(value.as_i64().unwrap_or_default() * 2)
    });
    hooks.add_filter_with("number.modify", 10, |value, _extras| {
        json!(value.as_i64().unwrap_or_default() + 10)
    });

    let result = hooks.apply_filters("number.modify", json!(5), &[]);

    // (5 + 10) * 2, not (5 * 2) + 10.
    assert_eq!(result, json!(30));
}

#[test]
fn test_extras_are_identical_for_every_callback() {
    let mut hooks = HookManager::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    for _ in 0..2 {
        let log = seen.clone();
        hooks.add_filter("price.calculate", move |value, extras| {
            log.lock().unwrap().push(extras.to_vec());
            json!(value.as_f64().unwrap_or_default() + extras[0].as_f64().unwrap_or_default())
        });
    }

    let result = hooks.apply_filters("price.calculate", json!(100.0), &[json!(20.0)]);

    assert_eq!(result, json!(140.0));
    let calls = seen.lock().unwrap();
    assert_eq!(calls.len(), 2);
    // Extras do not evolve with the value.
    assert_eq!(calls[0], calls[1]);
}

#[test]
fn test_unregistered_channel_returns_value_unchanged() {
    let hooks = HookManager::new();
    let value = json!({"nested": ["structure", 1, 2]});

    let result = hooks.apply_filters("non.existent", value.clone(), &[]);

    assert_eq!(result, value);
}

#[test]
fn test_filters_can_change_value_type() {
    let mut hooks = HookManager::new();
    hooks.add_filter("convert.to.array", |value, _extras| {
        let parts: Vec<&str> = value.as_str().unwrap_or_default().split(',').collect();
        json!(parts)
    });

    let result = hooks.apply_filters("convert.to.array", json!("a,b,c"), &[]);

    assert_eq!(result, json!(["a", "b", "c"]));
}

#[test]
fn test_reset_clears_filters() {
    let mut hooks = HookManager::new();
    hooks.add_filter("text.shout", |value, _extras| {
        json!(value.as_str().unwrap_or_default().to_uppercase())
    });

    hooks.reset();

    let result = hooks.apply_filters("text.shout", json!("quiet"), &[]);
    assert_eq!(result, json!("quiet"));
}
