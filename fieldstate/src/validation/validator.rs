//! The validator capability.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;

use super::Outcome;

type CheckFn<V> = dyn Fn(&V) -> Outcome + Send + Sync;

/// A single validation step for values of type `V`.
///
/// Cheap to clone; clones share the underlying function.
pub struct Validator<V> {
    check: Arc<CheckFn<V>>,
}

impl<V: 'static> Validator<V> {
    /// Create a validator from a function returning a full [`Outcome`].
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&V) -> Outcome + Send + Sync + 'static,
    {
        Self { check: Arc::new(f) }
    }

    /// Create a synchronous validator returning `Some(reason)` on failure.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&V) -> Option<String> + Send + Sync + 'static,
    {
        Self::new(move |value| Outcome::from(f(value)))
    }

    /// Create a synchronous validator from a predicate and a failure message.
    pub fn rule<F>(f: F, msg: impl Into<String>) -> Self
    where
        F: Fn(&V) -> bool + Send + Sync + 'static,
    {
        let msg = msg.into();
        Self::new(move |value| {
            if f(value) {
                Outcome::Valid
            } else {
                Outcome::Invalid(msg.clone())
            }
        })
    }

    /// Create an asynchronous validator.
    ///
    /// The function receives an owned copy of the value so the future can
    /// outlive the edit that started it.
    pub fn async_fn<F, Fut>(f: F) -> Self
    where
        V: Clone,
        F: Fn(V) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<String>> + Send + 'static,
    {
        Self::new(move |value: &V| Outcome::Pending(f(value.clone()).boxed()))
    }

    /// Create an asynchronous validator from a predicate and a failure message.
    pub fn async_rule<F, Fut>(f: F, msg: impl Into<String>) -> Self
    where
        V: Clone,
        F: Fn(V) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let msg = msg.into();
        Self::async_fn(move |value| {
            let fut = f(value);
            let msg = msg.clone();
            async move { if fut.await { None } else { Some(msg) } }
        })
    }
}

impl<V> Validator<V> {
    /// Run this validator against a value.
    pub fn check(&self, value: &V) -> Outcome {
        (self.check)(value)
    }
}

impl<V> Clone for Validator<V> {
    fn clone(&self) -> Self {
        Self {
            check: Arc::clone(&self.check),
        }
    }
}

impl<V> fmt::Debug for Validator<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator").finish_non_exhaustive()
    }
}
