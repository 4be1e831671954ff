//! Tests for synchronous field state behavior.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use fieldstate::prelude::*;
use fieldstate::{VALIDATION_FAILED_MESSAGE, wakeup};

fn only_foo() -> Validator<String> {
    Validator::from_fn(|v: &String| (v != "foo").then(|| "I only allow 'foo'".to_string()))
}

#[test]
fn test_magic_word_field() {
    let field = FieldState::new(String::new()).validators([only_foo()]);

    field.on_change("bar".to_string());
    let snapshot = field.snapshot();
    assert_eq!(snapshot.value, "bar");
    assert_eq!(snapshot.error.as_deref(), Some("I only allow 'foo'"));
    assert!(snapshot.dirty);
    assert!(!snapshot.validating);

    field.on_change("foo".to_string());
    let snapshot = field.snapshot();
    assert_eq!(snapshot.value, "foo");
    assert_eq!(snapshot.error, None);
    assert!(snapshot.dirty);
    assert_eq!(field.validated_value().as_deref(), Some("foo"));
}

#[test]
fn test_new_field_is_pristine() {
    let field = FieldState::new(5u32);
    let snapshot = field.snapshot();
    assert_eq!(snapshot.value, 5);
    assert!(!snapshot.dirty);
    assert!(!snapshot.touched);
    assert!(!snapshot.validating);
    assert!(!snapshot.has_been_validated);
    assert_eq!(snapshot.error, None);
    assert!(field.is_auto_validation_enabled());
}

#[test]
fn test_dirty_tracks_initial_value() {
    let field = FieldState::create("abc".to_string());
    field.set_value("abcd".to_string());
    assert!(field.is_dirty());
    field.set_value("abc".to_string());
    assert!(!field.is_dirty());
    assert_eq!(field.initial_value(), "abc");
}

#[test]
fn test_custom_equality_decides_dirty() {
    let field =
        FieldState::new("abc".to_string()).with_equality(|a, b| a.eq_ignore_ascii_case(b));
    field.set_value("ABC".to_string());
    assert!(!field.is_dirty());
    field.set_value("abd".to_string());
    assert!(field.is_dirty());
}

#[test]
fn test_touched_does_not_validate() {
    let calls = Arc::new(AtomicUsize::new(0));
    let field = FieldState::new(String::new()).validators([common::counting(&calls, |_| None)]);

    field.on_blur();
    assert!(field.is_touched());
    assert!(!field.has_been_validated());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_reset_clears_everything() {
    let field = FieldState::new(String::new()).validators([only_foo()]);
    field.on_change("bar".to_string());
    field.on_blur();
    assert!(field.has_error());

    field.reset();
    let snapshot = field.snapshot();
    assert_eq!(snapshot.value, "");
    assert!(!snapshot.dirty);
    assert!(!snapshot.touched);
    assert!(!snapshot.validating);
    assert!(!snapshot.has_been_validated);
    assert_eq!(snapshot.error, None);
    assert_eq!(field.validated_value(), None);
}

#[test]
fn test_reset_to_new_baseline() {
    let field = FieldState::new("draft".to_string());
    field.set_value("edited".to_string());

    field.reset_to("saved".to_string());
    assert_eq!(field.value(), "saved");
    assert_eq!(field.initial_value(), "saved");
    assert!(!field.is_dirty());

    field.set_value("draft".to_string());
    assert!(field.is_dirty());
}

#[test]
fn test_same_value_twice_matches_once() {
    let once = FieldState::new(String::new()).validators([only_foo()]);
    once.set_value("bar".to_string());

    let twice = FieldState::new(String::new()).validators([only_foo()]);
    twice.set_value("bar".to_string());
    twice.set_value("bar".to_string());

    assert_eq!(once.snapshot(), twice.snapshot());
}

#[test]
fn test_each_transition_notifies_once() {
    let field = FieldState::new(String::new()).validators([only_foo()]);
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    field.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    field.on_change("bar".to_string());
    assert_eq!(count.load(Ordering::SeqCst), 1);
    field.on_change("foo".to_string());
    assert_eq!(count.load(Ordering::SeqCst), 2);
    field.on_blur();
    field.on_blur();
    assert_eq!(count.load(Ordering::SeqCst), 3);
    field.reset();
    assert_eq!(count.load(Ordering::SeqCst), 4);
}

#[test]
fn test_listener_sees_applied_outcome() {
    let field = FieldState::new(String::new()).validators([only_foo()]);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    field.subscribe(move |snapshot: &FieldSnapshot<String>| {
        sink.lock().unwrap().push(snapshot.error.clone());
    });

    field.on_change("bar".to_string());
    field.on_change("foo".to_string());

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![Some("I only allow 'foo'".to_string()), None]
    );
}

#[test]
fn test_unsubscribe_stops_notifications() {
    let field = FieldState::new(0i32);
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    let id = field.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    field.set_value(1);
    assert!(field.unsubscribe(id));
    assert!(!field.unsubscribe(id));
    field.set_value(2);

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(field.subscriber_count(), 0);
}

#[test]
fn test_panicking_listener_does_not_block_others() {
    common::init_logging();
    let field = FieldState::new(0i32);
    field.subscribe(|_| panic!("renderer crashed"));
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    field.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    field.set_value(1);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_listener_may_read_the_field() {
    let field = FieldState::new(String::new()).validators([only_foo()]);
    let observed = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&observed);
    let reader = field.clone();
    field.subscribe(move |_| {
        *sink.lock().unwrap() = Some(reader.value());
    });

    field.on_change("foo".to_string());
    assert_eq!(observed.lock().unwrap().as_deref(), Some("foo"));
}

#[test]
fn test_listener_edit_is_delivered_after_current_transition() {
    let field = FieldState::new(String::new()).validators([only_foo()]);
    let writer = field.clone();
    field.subscribe(move |snapshot| {
        if snapshot.value == "bar" {
            writer.on_change("foo".to_string());
        }
    });
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    field.subscribe(move |snapshot: &FieldSnapshot<String>| {
        sink.lock().unwrap().push((snapshot.value.clone(), snapshot.error.clone()));
    });

    field.on_change("bar".to_string());

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            ("bar".to_string(), Some("I only allow 'foo'".to_string())),
            ("foo".to_string(), None),
        ]
    );
    assert_eq!(field.value(), "foo");
}

#[test]
fn test_on_did_change_reports_real_changes() {
    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&changes);
    let field = FieldState::new("a".to_string()).on_did_change(move |change| {
        sink.lock().unwrap().push(change.clone());
    });

    field.set_value("b".to_string());
    field.set_value("b".to_string());

    let changes = changes.lock().unwrap();
    assert_eq!(
        *changes,
        vec![ValueChange {
            old: "a".to_string(),
            new: "b".to_string(),
        }]
    );
}

#[test]
fn test_set_error_overrides_until_next_pass() {
    let field = FieldState::new(String::new()).validators([only_foo()]);
    field.on_change("foo".to_string());

    field.set_error(Some("already registered".to_string()));
    assert_eq!(field.error().as_deref(), Some("already registered"));

    field.on_change("foo".to_string());
    assert_eq!(field.error(), None);
}

#[test]
fn test_manual_validation_skips_auto_pass() {
    let calls = Arc::new(AtomicUsize::new(0));
    let field = FieldState::with_config(String::new(), FieldConfig::new().manual_validation())
        .validators([common::counting(&calls, |_| Some("nope".to_string()))]);

    field.on_change("x".to_string());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!field.has_error());

    field.enable_auto_validation();
    field.on_change("y".to_string());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(field.has_error());

    field.disable_auto_validation();
    assert!(!field.is_auto_validation_enabled());
}

#[test]
fn test_replacing_validators_applies_to_next_edit() {
    let field = FieldState::new(String::new()).validators([only_foo()]);
    field.on_change("bar".to_string());
    assert!(field.has_error());

    field.set_validators([rules::required("required")]);
    assert!(field.has_error());

    field.on_change("bar".to_string());
    assert!(!field.has_error());
}

#[test]
fn test_async_validator_without_runtime_is_a_fault() {
    common::init_logging();
    let field = FieldState::new(String::new())
        .validators([Validator::async_fn(|_: String| async { None })]);

    field.on_change("value".to_string());
    assert_eq!(field.error().as_deref(), Some(VALIDATION_FAILED_MESSAGE));
    assert!(!field.is_validating());
}

#[test]
fn test_panicking_validator_marks_field_invalid() {
    common::init_logging();
    let field = FieldState::new(String::new()).validators([Validator::from_fn(
        |v: &String| -> Option<String> { panic!("unexpected input {v}") },
    )]);

    field.on_change("value".to_string());
    assert_eq!(field.error().as_deref(), Some(VALIDATION_FAILED_MESSAGE));
}

#[test]
fn test_wakeup_per_transition() {
    let (sender, mut receiver) = wakeup::channel();
    let field = FieldState::new(String::new()).validators([only_foo()]);
    field.install_wakeup(sender);

    field.on_change("bar".to_string());
    field.on_blur();
    assert_eq!(receiver.drain(), 2);
    assert_eq!(receiver.drain(), 0);
}

#[test]
fn test_disposed_field_ignores_mutation() {
    let field = FieldState::new(String::new()).validators([only_foo()]);
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    field.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    field.dispose();
    field.on_change("bar".to_string());
    field.on_blur();
    field.reset_to("x".to_string());

    assert!(field.is_disposed());
    assert_eq!(field.value(), "");
    assert!(!field.is_touched());
    assert_eq!(count.load(Ordering::SeqCst), 0);
    assert_eq!(field.subscriber_count(), 0);
}

#[test]
fn test_builtin_rules_on_a_field() {
    let field = FieldState::new(String::new()).validators([
        rules::required("Email is required"),
        rules::email("Please enter a valid email"),
    ]);

    field.on_change(String::new());
    assert_eq!(field.error().as_deref(), Some("Email is required"));
    field.on_change("nope".to_string());
    assert_eq!(field.error().as_deref(), Some("Please enter a valid email"));
    field.on_change("someone@example.com".to_string());
    assert_eq!(field.error(), None);
}

#[test]
fn test_checkbox_field() {
    let field = FieldState::new(false).validators([rules::checked("You must accept the terms")]);
    field.on_change(false);
    assert!(field.has_error());
    field.on_change(true);
    assert!(!field.has_error());
}
