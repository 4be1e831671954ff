//! Shared helpers for field state integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fieldstate::{FieldSnapshot, FieldState, Validator};
use simplelog::{Config, LevelFilter, TestLogger};
use tokio::sync::{Notify, mpsc};

/// Route library logs through the test harness' captured output.
pub fn init_logging() {
    let _ = TestLogger::init(LevelFilter::Trace, Config::default());
}

/// Asynchronous validators whose answers are released by the test, one gate
/// per input value.
#[derive(Clone, Default)]
pub struct Gates {
    inner: Arc<Mutex<HashMap<String, Arc<Notify>>>>,
}

impl Gates {
    fn gate(&self, key: &str) -> Arc<Notify> {
        let mut gates = self.inner.lock().unwrap();
        Arc::clone(gates.entry(key.to_string()).or_default())
    }

    /// Let the validator waiting on `key` answer. Order-insensitive: releasing
    /// before the validator starts waiting stores the permit.
    pub fn release(&self, key: &str) {
        self.gate(key).notify_one();
    }

    /// Async validator answering "too short" for values under `min` characters.
    pub fn min_length(&self, min: usize) -> Validator<String> {
        let gates = self.clone();
        Validator::async_fn(move |value: String| {
            let gate = gates.gate(&value);
            async move {
                gate.notified().await;
                (value.chars().count() < min).then(|| "too short".to_string())
            }
        })
    }
}

/// A synchronous validator that counts its calls.
pub fn counting(
    calls: &Arc<AtomicUsize>,
    check: impl Fn(&String) -> Option<String> + Send + Sync + 'static,
) -> Validator<String> {
    let calls = Arc::clone(calls);
    Validator::from_fn(move |value: &String| {
        calls.fetch_add(1, Ordering::SeqCst);
        check(value)
    })
}

/// Forward every notified snapshot into a channel.
pub fn record<V>(field: &FieldState<V>) -> mpsc::UnboundedReceiver<FieldSnapshot<V>>
where
    V: Clone + PartialEq + Send + Sync + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    field.subscribe(move |snapshot| {
        let _ = tx.send(snapshot.clone());
    });
    rx
}

/// Wait for the next notified snapshot that is not validating.
pub async fn next_settled<V>(events: &mut mpsc::UnboundedReceiver<FieldSnapshot<V>>) -> FieldSnapshot<V> {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let snapshot = events.recv().await.expect("field stopped notifying");
            if !snapshot.validating {
                return snapshot;
            }
        }
    })
    .await
    .expect("field never settled")
}

/// Give spawned validation tasks a chance to run.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
}
