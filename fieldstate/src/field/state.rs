use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use super::FieldConfig;
use super::listeners::{Dispatcher, Listener, Listeners, Notice, SubscriptionId};
use super::snapshot::{FieldSnapshot, ValueChange};
use crate::error::{FieldStateError, VALIDATION_FAILED_MESSAGE};
use crate::validation::{Evaluation, Validation, Validator, pipeline};
use crate::wakeup::WakeupSender;

type Equality<V> = Arc<dyn Fn(&V, &V) -> bool + Send + Sync>;
type ChangeHook<V> = Arc<dyn Fn(&ValueChange<V>) + Send + Sync>;

/// Internal state for a field.
struct FieldInner<V> {
    value: V,
    initial_value: V,
    touched: bool,
    error: Option<String>,
    validating: bool,
    has_been_validated: bool,
    validated_value: Option<V>,
    validators: Arc<[Validator<V>]>,
    /// Bumped on every edit, reset, explicit validation and dispose.
    generation: u64,
    /// Cancels the spawned work of the current generation, if any.
    in_flight: Option<CancellationToken>,
    auto_validation: bool,
    debounce: Option<Duration>,
    disposed: bool,
    equality: Equality<V>,
    on_did_change: Option<ChangeHook<V>>,
    listeners: Listeners<V>,
    wakeup: Option<WakeupSender>,
}

impl<V: Clone> FieldInner<V> {
    fn snapshot(&self) -> FieldSnapshot<V> {
        FieldSnapshot {
            value: self.value.clone(),
            error: self.error.clone(),
            dirty: self.is_dirty(),
            touched: self.touched,
            validating: self.validating,
            has_been_validated: self.has_been_validated,
        }
    }

    fn notice(&self) -> Notice<V> {
        Notice::new(self.snapshot(), &self.listeners, self.wakeup.as_ref())
    }

    fn is_dirty(&self) -> bool {
        !(self.equality)(&self.value, &self.initial_value)
    }

    fn is_current(&self, generation: u64) -> bool {
        !self.disposed && self.generation == generation
    }

    /// Start a new generation, abandoning whatever the previous one was doing.
    fn advance(&mut self) -> u64 {
        self.generation += 1;
        self.validating = false;
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
        self.generation
    }

    /// Hand out the cancellation token for work spawned by the current generation.
    fn arm(&mut self) -> CancellationToken {
        let token = CancellationToken::new();
        if let Some(previous) = self.in_flight.replace(token.clone()) {
            previous.cancel();
        }
        token
    }

    fn apply(&mut self, error: Option<String>, value: V) {
        self.validating = false;
        self.has_been_validated = true;
        self.in_flight = None;
        if error.is_none() {
            self.validated_value = Some(value);
        }
        self.error = error;
    }
}

/// Work left over after a pass was started under the lock.
enum Scheduled {
    /// An asynchronous validator is outstanding.
    Resolve {
        handle: Handle,
        token: CancellationToken,
        generation: u64,
        pending: BoxFuture<'static, Option<String>>,
    },
    /// Automatic validation is waiting out the debounce window.
    Debounce {
        handle: Handle,
        token: CancellationToken,
        generation: u64,
        delay: Duration,
    },
}

/// Reactive, validatable state for a single form field.
///
/// `FieldState<V>` owns the value, runs the configured validators on every
/// change and notifies subscribers after each completed transition. It is a
/// cheap-to-clone handle; all clones share the same field. Asynchronous
/// validators are driven on the current tokio runtime, and their results are
/// only applied while the edit that started them is still the latest one.
///
/// # Example
///
/// ```ignore
/// let field = FieldState::new(String::new())
///     .validators([Validator::from_fn(|v: &String| {
///         (v != "foo").then(|| "I only allow 'foo'".to_string())
///     })]);
///
/// field.subscribe(|snapshot| render(snapshot));
/// field.on_change("bar".to_string());
/// assert_eq!(field.error().as_deref(), Some("I only allow 'foo'"));
/// ```
pub struct FieldState<V> {
    inner: Arc<Mutex<FieldInner<V>>>,
    dispatch: Arc<Dispatcher<V>>,
}

impl<V> FieldState<V>
where
    V: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a field with the given initial value and the default config.
    pub fn new(initial_value: V) -> Self {
        Self::with_config(initial_value, FieldConfig::default())
    }

    /// Alias for [`FieldState::new`].
    pub fn create(initial_value: V) -> Self {
        Self::new(initial_value)
    }

    /// Create a field with an explicit config.
    pub fn with_config(initial_value: V, config: FieldConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FieldInner {
                value: initial_value.clone(),
                initial_value,
                touched: false,
                error: None,
                validating: false,
                has_been_validated: false,
                validated_value: None,
                validators: Arc::from(Vec::new()),
                generation: 0,
                in_flight: None,
                auto_validation: config.auto_validation,
                debounce: config.debounce,
                disposed: false,
                equality: Arc::new(|a: &V, b: &V| a == b),
                on_did_change: None,
                listeners: Listeners::new(),
                wakeup: None,
            })),
            dispatch: Arc::new(Dispatcher::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FieldInner<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -------------------------------------------------------------------------
    // Configuration
    // -------------------------------------------------------------------------

    /// Set the validators, replacing any previous list.
    pub fn validators(self, validators: impl IntoIterator<Item = Validator<V>>) -> Self {
        self.set_validators(validators);
        self
    }

    /// Replace the validator list.
    ///
    /// Passes already in flight keep the list they started with. Nothing is
    /// re-validated until the next edit or `validate()` call.
    pub fn set_validators(&self, validators: impl IntoIterator<Item = Validator<V>>) {
        let validators: Arc<[Validator<V>]> = validators.into_iter().collect();
        let mut inner = self.lock();
        log::debug!("field configured with {} validators", validators.len());
        inner.validators = validators;
    }

    /// Decide dirtiness with a custom equality instead of `PartialEq`.
    pub fn with_equality<F>(self, eq: F) -> Self
    where
        F: Fn(&V, &V) -> bool + Send + Sync + 'static,
    {
        self.lock().equality = Arc::new(eq);
        self
    }

    /// Register a hook called whenever `set_value` actually changes the value.
    pub fn on_did_change<F>(self, hook: F) -> Self
    where
        F: Fn(&ValueChange<V>) + Send + Sync + 'static,
    {
        self.lock().on_did_change = Some(Arc::new(hook));
        self
    }

    /// Validate automatically on every change.
    pub fn enable_auto_validation(&self) {
        self.lock().auto_validation = true;
    }

    /// Only validate on explicit `validate()` calls.
    pub fn disable_auto_validation(&self) {
        self.lock().auto_validation = false;
    }

    // -------------------------------------------------------------------------
    // Observation
    // -------------------------------------------------------------------------

    /// Register a listener called with a fresh snapshot after every completed
    /// transition.
    ///
    /// Listeners see transitions in the order they happened. A transition made
    /// while another thread is delivering is handed to that thread, so the
    /// call that caused it may return before listeners have run.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&FieldSnapshot<V>) + Send + Sync + 'static,
    {
        let listener: Listener<V> = Arc::new(listener);
        self.lock().listeners.add(listener)
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.lock().listeners.remove(id)
    }

    /// Number of registered listeners.
    pub fn subscriber_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Install a wakeup sender, signalled after every completed transition.
    pub fn install_wakeup(&self, sender: WakeupSender) {
        self.lock().wakeup = Some(sender);
    }

    // -------------------------------------------------------------------------
    // Read methods
    // -------------------------------------------------------------------------

    /// Get an immutable view of the field.
    pub fn snapshot(&self) -> FieldSnapshot<V> {
        self.lock().snapshot()
    }

    /// Get the current value.
    pub fn value(&self) -> V {
        self.lock().value.clone()
    }

    /// Get the value the field was created or last reset with.
    pub fn initial_value(&self) -> V {
        self.lock().initial_value.clone()
    }

    /// Get the current error message (if any).
    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    /// Check if the field has an error.
    pub fn has_error(&self) -> bool {
        self.lock().error.is_some()
    }

    /// Check if the value differs from the initial value.
    pub fn is_dirty(&self) -> bool {
        self.lock().is_dirty()
    }

    /// Check if the field has been blurred.
    pub fn is_touched(&self) -> bool {
        self.lock().touched
    }

    /// Check if an asynchronous pass for the current value is outstanding.
    pub fn is_validating(&self) -> bool {
        self.lock().validating
    }

    /// Check if any validation pass has been applied since creation or reset.
    pub fn has_been_validated(&self) -> bool {
        self.lock().has_been_validated
    }

    /// Get the last value that passed validation.
    pub fn validated_value(&self) -> Option<V> {
        self.lock().validated_value.clone()
    }

    /// Check if the field validates on every change.
    pub fn is_auto_validation_enabled(&self) -> bool {
        self.lock().auto_validation
    }

    /// Check if the field has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.lock().disposed
    }

    // -------------------------------------------------------------------------
    // Write methods
    // -------------------------------------------------------------------------

    /// Set the value and, unless disabled, validate it.
    ///
    /// Synchronous outcomes are applied before this returns. If a validator
    /// defers, the field reports `validating` until the answer arrives; an
    /// answer for a value that has since been replaced is dropped.
    pub fn set_value(&self, value: V) {
        let (generation, change, auto_validation, debounce) = {
            let mut inner = self.lock();
            if inner.disposed {
                log::warn!("ignoring value change on a disposed field");
                return;
            }
            let old = std::mem::replace(&mut inner.value, value);
            let change = if (inner.equality)(&old, &inner.value) {
                None
            } else {
                inner.on_did_change.clone().map(|hook| {
                    let change = ValueChange {
                        old,
                        new: inner.value.clone(),
                    };
                    (hook, change)
                })
            };
            let generation = inner.advance();
            (generation, change, inner.auto_validation, inner.debounce)
        };
        log::trace!("field value changed, generation {generation}");

        if let Some((hook, change)) = change {
            hook(&change);
        }

        if !auto_validation {
            self.notify_if_current(generation);
            return;
        }

        match (debounce, Handle::try_current()) {
            (Some(delay), Ok(handle)) => {
                let token = {
                    let mut inner = self.lock();
                    if !inner.is_current(generation) {
                        return;
                    }
                    inner.arm()
                };
                self.notify_if_current(generation);
                self.schedule(Scheduled::Debounce {
                    handle,
                    token,
                    generation,
                    delay,
                });
            }
            _ => self.run_pass(generation),
        }
    }

    /// UI alias for [`FieldState::set_value`].
    pub fn on_change(&self, value: V) {
        self.set_value(value);
    }

    /// Mark the field as touched. Does not validate.
    pub fn mark_touched(&self) {
        {
            let mut inner = self.lock();
            if inner.disposed || inner.touched {
                return;
            }
            inner.touched = true;
            self.dispatch.enqueue(inner.notice());
        }
        self.dispatch.drain();
    }

    /// UI alias for [`FieldState::mark_touched`].
    pub fn on_blur(&self) {
        self.mark_touched();
    }

    /// Override the error message, e.g. with a server-side rejection.
    ///
    /// The next validation pass replaces it.
    pub fn set_error(&self, error: Option<String>) {
        {
            let mut inner = self.lock();
            if inner.disposed {
                return;
            }
            inner.error = error;
            self.dispatch.enqueue(inner.notice());
        }
        self.dispatch.drain();
    }

    /// Restore the initial value and clear every interaction flag.
    pub fn reset(&self) {
        self.restore(None);
    }

    /// Make `baseline` the new initial value and restore it.
    pub fn reset_to(&self, baseline: V) {
        self.restore(Some(baseline));
    }

    fn restore(&self, baseline: Option<V>) {
        {
            let mut inner = self.lock();
            if inner.disposed {
                return;
            }
            if let Some(baseline) = baseline {
                inner.initial_value = baseline;
            }
            inner.value = inner.initial_value.clone();
            inner.touched = false;
            inner.error = None;
            inner.has_been_validated = false;
            inner.validated_value = None;
            let generation = inner.advance();
            log::debug!("field reset, generation {generation}");
            self.dispatch.enqueue(inner.notice());
        }
        self.dispatch.drain();
    }

    /// Validate the current value now and wait for the result.
    ///
    /// Supersedes any pass already in flight. If the field changes again
    /// before this pass finishes, the pass is discarded and the field's status
    /// at that moment is reported instead. Dropping the returned future while
    /// it waits on a deferred validator clears `validating` again.
    pub async fn validate(&self) -> Result<Validation<V>, FieldStateError> {
        let (generation, value, validators) = {
            let mut inner = self.lock();
            if inner.disposed {
                return Err(FieldStateError::Disposed);
            }
            let generation = inner.advance();
            (generation, inner.value.clone(), Arc::clone(&inner.validators))
        };

        let error = match pipeline::evaluate(&value, &validators) {
            Evaluation::Valid => None,
            Evaluation::Invalid(message) => Some(message),
            Evaluation::Pending(pending) => {
                self.mark_validating(generation);
                let mut guard = ValidateGuard {
                    field: self,
                    generation,
                    armed: true,
                };
                let error = pending.await;
                guard.armed = false;
                error
            }
        };

        {
            let mut inner = self.lock();
            if inner.disposed {
                return Err(FieldStateError::Disposed);
            }
            if !inner.is_current(generation) {
                log::trace!("discarding superseded validation for generation {generation}");
                return Ok(match &inner.error {
                    Some(message) => Validation::Invalid(message.clone()),
                    None => Validation::Valid(inner.value.clone()),
                });
            }
            inner.apply(error.clone(), value.clone());
            self.dispatch.enqueue(inner.notice());
        }
        self.dispatch.drain();

        Ok(match error {
            Some(message) => Validation::Invalid(message),
            None => Validation::Valid(value),
        })
    }

    /// Tear the field down.
    ///
    /// Cancels in-flight validation, drops every listener and ignores all
    /// further mutation.
    pub fn dispose(&self) {
        let mut inner = self.lock();
        if inner.disposed {
            return;
        }
        inner.advance();
        inner.disposed = true;
        inner.listeners.clear();
        inner.wakeup = None;
        log::debug!("field disposed");
    }

    // -------------------------------------------------------------------------
    // Validation passes
    // -------------------------------------------------------------------------

    /// Run the pipeline for `generation` and apply or schedule its outcome.
    fn run_pass(&self, generation: u64) {
        let (value, validators) = {
            let inner = self.lock();
            if !inner.is_current(generation) {
                return;
            }
            (inner.value.clone(), Arc::clone(&inner.validators))
        };

        // Validators run without the lock so they may read the field.
        let evaluation = pipeline::evaluate(&value, &validators);

        let scheduled = {
            let mut inner = self.lock();
            if !inner.is_current(generation) {
                log::trace!("discarding superseded pass for generation {generation}");
                return;
            }
            let scheduled = match evaluation {
                Evaluation::Valid => {
                    inner.apply(None, value);
                    None
                }
                Evaluation::Invalid(message) => {
                    inner.apply(Some(message), value);
                    None
                }
                Evaluation::Pending(pending) => match Handle::try_current() {
                    Ok(handle) => {
                        inner.validating = true;
                        Some(Scheduled::Resolve {
                            handle,
                            token: inner.arm(),
                            generation,
                            pending,
                        })
                    }
                    Err(_) => {
                        log::warn!("no tokio runtime to drive an asynchronous validator");
                        inner.apply(Some(VALIDATION_FAILED_MESSAGE.to_string()), value);
                        None
                    }
                },
            };
            self.dispatch.enqueue(inner.notice());
            scheduled
        };

        self.dispatch.drain();
        if let Some(scheduled) = scheduled {
            self.schedule(scheduled);
        }
    }

    fn schedule(&self, scheduled: Scheduled) {
        let field = self.clone();
        match scheduled {
            Scheduled::Resolve {
                handle,
                token,
                generation,
                pending,
            } => {
                handle.spawn(async move {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => {
                            log::trace!("validation for generation {generation} cancelled");
                        }
                        error = pending => field.resolve(generation, error),
                    }
                });
            }
            Scheduled::Debounce {
                handle,
                token,
                generation,
                delay,
            } => {
                handle.spawn(async move {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => {}
                        _ = tokio::time::sleep(delay) => field.run_pass(generation),
                    }
                });
            }
        }
    }

    /// Apply the answer of a deferred pass if its generation is still current.
    fn resolve(&self, generation: u64, error: Option<String>) {
        {
            let mut inner = self.lock();
            if !inner.is_current(generation) {
                log::trace!("discarding stale result for generation {generation}");
                return;
            }
            let value = inner.value.clone();
            inner.apply(error, value);
            self.dispatch.enqueue(inner.notice());
        }
        self.dispatch.drain();
    }

    fn mark_validating(&self, generation: u64) {
        {
            let mut inner = self.lock();
            if !inner.is_current(generation) {
                return;
            }
            inner.validating = true;
            self.dispatch.enqueue(inner.notice());
        }
        self.dispatch.drain();
    }

    /// A `validate()` call stopped waiting; nothing is outstanding any more.
    fn abandon(&self, generation: u64) {
        {
            let mut inner = self.lock();
            if !inner.is_current(generation) || !inner.validating {
                return;
            }
            log::debug!("validation for generation {generation} abandoned");
            inner.validating = false;
            self.dispatch.enqueue(inner.notice());
        }
        self.dispatch.drain();
    }

    fn notify_if_current(&self, generation: u64) {
        {
            let inner = self.lock();
            if !inner.is_current(generation) {
                return;
            }
            self.dispatch.enqueue(inner.notice());
        }
        self.dispatch.drain();
    }
}

/// Held across the deferred part of `validate()`.
struct ValidateGuard<'a, V>
where
    V: Clone + PartialEq + Send + Sync + 'static,
{
    field: &'a FieldState<V>,
    generation: u64,
    armed: bool,
}

impl<V> Drop for ValidateGuard<'_, V>
where
    V: Clone + PartialEq + Send + Sync + 'static,
{
    fn drop(&mut self) {
        if self.armed {
            self.field.abandon(self.generation);
        }
    }
}

impl<V> Clone for FieldState<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            dispatch: Arc::clone(&self.dispatch),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for FieldState<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("FieldState")
            .field("value", &inner.value)
            .field("error", &inner.error)
            .field("touched", &inner.touched)
            .field("validating", &inner.validating)
            .field("generation", &inner.generation)
            .finish_non_exhaustive()
    }
}
