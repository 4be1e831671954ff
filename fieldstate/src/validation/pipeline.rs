//! Ordered, short-circuiting evaluation of a validator list.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use super::{Evaluation, Outcome, Validator};
use crate::error::{VALIDATION_FAILED_MESSAGE, extract_panic_message};

/// Evaluate `validators` against `value` in order.
///
/// Synchronous validators run immediately. The first synchronous failure
/// short-circuits the list. When a validator defers, the remaining list is
/// folded into the returned [`Evaluation::Pending`] future and only runs once
/// the deferred answer comes back clean.
///
/// A validator that panics is reported as a failure carrying
/// [`VALIDATION_FAILED_MESSAGE`].
pub fn evaluate<V>(value: &V, validators: &Arc<[Validator<V>]>) -> Evaluation
where
    V: Clone + Send + Sync + 'static,
{
    evaluate_from(value, validators, 0)
}

/// Drive the whole pipeline to completion, returning the first failure.
pub async fn evaluate_all<V>(value: &V, validators: &Arc<[Validator<V>]>) -> Option<String>
where
    V: Clone + Send + Sync + 'static,
{
    match evaluate(value, validators) {
        Evaluation::Valid => None,
        Evaluation::Invalid(message) => Some(message),
        Evaluation::Pending(pending) => pending.await,
    }
}

fn evaluate_from<V>(value: &V, validators: &Arc<[Validator<V>]>, start: usize) -> Evaluation
where
    V: Clone + Send + Sync + 'static,
{
    for (index, validator) in validators.iter().enumerate().skip(start) {
        match check_guarded(validator, value) {
            Outcome::Valid => {}
            Outcome::Invalid(message) => {
                log::trace!("validator {index} rejected value: {message}");
                return Evaluation::Invalid(message);
            }
            Outcome::Pending(pending) => {
                log::trace!("validator {index} deferred");
                let value = value.clone();
                let validators = Arc::clone(validators);
                return Evaluation::Pending(Box::pin(async move {
                    if let Some(message) = await_guarded(pending).await {
                        return Some(message);
                    }
                    match evaluate_from(&value, &validators, index + 1) {
                        Evaluation::Valid => None,
                        Evaluation::Invalid(message) => Some(message),
                        Evaluation::Pending(rest) => rest.await,
                    }
                }));
            }
        }
    }
    Evaluation::Valid
}

fn check_guarded<V>(validator: &Validator<V>, value: &V) -> Outcome {
    match panic::catch_unwind(AssertUnwindSafe(|| validator.check(value))) {
        Ok(outcome) => outcome,
        Err(panic) => {
            log::warn!("validator panicked: {}", extract_panic_message(&*panic));
            Outcome::Invalid(VALIDATION_FAILED_MESSAGE.to_string())
        }
    }
}

async fn await_guarded(pending: BoxFuture<'static, Option<String>>) -> Option<String> {
    match AssertUnwindSafe(pending).catch_unwind().await {
        Ok(error) => error,
        Err(panic) => {
            log::warn!(
                "asynchronous validator panicked: {}",
                extract_panic_message(&*panic)
            );
            Some(VALIDATION_FAILED_MESSAGE.to_string())
        }
    }
}
