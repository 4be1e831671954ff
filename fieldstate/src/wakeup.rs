//! Wakeup signals for render loops that only redraw after a field changes.
//!
//! Install a [`WakeupSender`] on any number of fields with
//! `FieldState::install_wakeup`; each notified transition sends one signal.
//! The loop awaits [`WakeupReceiver::wait`], which folds every signal that
//! piled up in the meantime into one wake, then re-reads the snapshots it draws.
//!
//! ```ignore
//! let (sender, mut wakeups) = wakeup::channel();
//! username.install_wakeup(sender.clone());
//! password.install_wakeup(sender);
//!
//! while let Some(changes) = wakeups.wait().await {
//!     log::trace!("redrawing after {changes} field transitions");
//!     draw(&username.snapshot(), &password.snapshot());
//! }
//! ```

use tokio::sync::mpsc;

/// Signals buffered before senders start dropping them. One pending signal is
/// enough to guarantee a redraw, so a small buffer loses nothing.
const PENDING_WAKEUPS: usize = 16;

/// Sending half, shared by every field that should wake the loop.
#[derive(Clone, Debug)]
pub struct WakeupSender {
    tx: mpsc::Sender<()>,
}

impl WakeupSender {
    /// Signal that a field transition was delivered. Never blocks.
    pub(crate) fn send(&self) {
        if self.tx.try_send(()).is_err() {
            log::trace!("wakeup dropped: buffer full or loop gone");
        }
    }
}

/// Receiving half, owned by the render loop.
#[derive(Debug)]
pub struct WakeupReceiver {
    rx: mpsc::Receiver<()>,
}

impl WakeupReceiver {
    /// Wait until at least one field transition happened.
    ///
    /// Returns the number of transitions folded into this wake, or `None` once
    /// every sender (and so every field holding one) is gone.
    pub async fn wait(&mut self) -> Option<usize> {
        self.rx.recv().await?;
        Some(1 + self.drain())
    }

    /// Consume pending signals without waiting, returning how many there were.
    pub fn drain(&mut self) -> usize {
        let mut drained = 0;
        while self.rx.try_recv().is_ok() {
            drained += 1;
        }
        drained
    }
}

/// Create a sender/receiver pair.
pub fn channel() -> (WakeupSender, WakeupReceiver) {
    let (tx, rx) = mpsc::channel(PENDING_WAKEUPS);
    (WakeupSender { tx }, WakeupReceiver { rx })
}
