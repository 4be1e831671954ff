//! Listener registry and delivery.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::FieldSnapshot;
use crate::error::extract_panic_message;
use crate::wakeup::WakeupSender;

pub(crate) type Listener<V> = Arc<dyn Fn(&FieldSnapshot<V>) + Send + Sync>;

/// Handle returned by `FieldState::subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub(crate) struct Listeners<V> {
    next_id: u64,
    entries: Vec<(SubscriptionId, Listener<V>)>,
}

impl<V> Listeners<V> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, listener: Listener<V>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    fn handles(&self) -> Vec<Listener<V>> {
        self.entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }
}

/// A completed transition waiting to be delivered.
///
/// Built while the field is locked, delivered after the lock is released so
/// listeners may call back into the field.
pub(crate) struct Notice<V> {
    snapshot: FieldSnapshot<V>,
    listeners: Vec<Listener<V>>,
    wakeup: Option<WakeupSender>,
}

impl<V> Notice<V> {
    pub(crate) fn new(
        snapshot: FieldSnapshot<V>,
        listeners: &Listeners<V>,
        wakeup: Option<&WakeupSender>,
    ) -> Self {
        Self {
            snapshot,
            listeners: listeners.handles(),
            wakeup: wakeup.cloned(),
        }
    }

    fn deliver(self) {
        for listener in &self.listeners {
            let result = panic::catch_unwind(AssertUnwindSafe(|| listener(&self.snapshot)));
            if let Err(panic) = result {
                log::error!("field listener panicked: {}", extract_panic_message(&*panic));
            }
        }
        if let Some(wakeup) = &self.wakeup {
            wakeup.send();
        }
    }
}

/// Per-field delivery queue.
///
/// Notices are enqueued while the field is locked, so queue order is
/// transition order. Only one thread drains at a time; a notice enqueued while
/// another thread (or a listener on this thread) is draining is delivered by
/// that drainer, after everything queued before it.
pub(crate) struct Dispatcher<V> {
    state: Mutex<DispatchState<V>>,
}

struct DispatchState<V> {
    queue: VecDeque<Notice<V>>,
    draining: bool,
}

impl<V> Dispatcher<V> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(DispatchState {
                queue: VecDeque::new(),
                draining: false,
            }),
        }
    }

    /// Queue a notice. Must be called with the field lock held.
    pub(crate) fn enqueue(&self, notice: Notice<V>) {
        self.lock().queue.push_back(notice);
    }

    /// Deliver queued notices in order unless someone else already is.
    ///
    /// Must be called without the field lock held.
    pub(crate) fn drain(&self) {
        {
            let mut state = self.lock();
            if state.draining || state.queue.is_empty() {
                return;
            }
            state.draining = true;
        }
        loop {
            let next = {
                let mut state = self.lock();
                match state.queue.pop_front() {
                    Some(notice) => notice,
                    None => {
                        state.draining = false;
                        return;
                    }
                }
            };
            next.deliver();
        }
    }

    fn lock(&self) -> MutexGuard<'_, DispatchState<V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
