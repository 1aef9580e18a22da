//! Transmission receipts.
//!
//! A [`Receipt`] is a single-shot completion signal bound to one
//! outbound stanza. It resolves to [`ReceiptState::Sent`] only after
//! the transport has actually written the stanza out of the process,
//! not merely queued it; that is the whole point. The typical use is a
//! write barrier before suspending:
//!
//! ```rust,ignore
//! let receipt = ext.go_on_standby();
//! // Block until the standby element has left the socket buffer.
//! receipt.wait(None).await;
//! ```
//!
//! Multiple independent waiters may wait on one receipt; all observe
//! the same terminal state. A timed-out wait leaves the receipt
//! pending and it may still resolve later.

use std::time::Duration;

use tokio::sync::watch;

/// Lifecycle of one outbound stanza's transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptState {
    /// Handed to the transport, not yet confirmed written
    Pending,
    /// Transport confirmed the bytes were written
    Sent,
    /// Transport closed or errored before confirmation
    Failed,
}

/// Outcome of [`Receipt::wait`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The stanza was transmitted
    Sent,
    /// The stanza was not transmitted before the connection ended
    Failed,
    /// The timeout elapsed first; the receipt is still pending and may
    /// resolve later. Treat as "unknown", not as failure.
    TimedOut,
}

/// Completion token for one outbound stanza.
///
/// Cheap to clone; every clone observes the same underlying signal.
#[derive(Debug, Clone)]
pub struct Receipt {
    rx: watch::Receiver<ReceiptState>,
}

impl Receipt {
    /// Current state without waiting.
    pub fn state(&self) -> ReceiptState {
        *self.rx.borrow()
    }

    /// Wait until the transmission resolves, or until `timeout`
    /// elapses. `None` waits indefinitely.
    pub async fn wait(&self, timeout: Option<Duration>) -> WaitOutcome {
        let mut rx = self.rx.clone();
        let resolved = rx.wait_for(|s| *s != ReceiptState::Pending);
        match timeout {
            None => match resolved.await {
                Ok(state) => (*state).into(),
                // Writer gone without resolving; the handle's Drop
                // publishes Failed first, so this arm is a backstop.
                Err(_) => WaitOutcome::Failed,
            },
            Some(duration) => match tokio::time::timeout(duration, resolved).await {
                Ok(Ok(state)) => (*state).into(),
                Ok(Err(_)) => WaitOutcome::Failed,
                Err(_) => WaitOutcome::TimedOut,
            },
        }
    }
}

impl From<ReceiptState> for WaitOutcome {
    fn from(state: ReceiptState) -> Self {
        match state {
            ReceiptState::Sent => WaitOutcome::Sent,
            ReceiptState::Failed | ReceiptState::Pending => WaitOutcome::Failed,
        }
    }
}

/// Writer-side handle that resolves a [`Receipt`] exactly once.
///
/// Dropping an unresolved handle resolves the receipt to `Failed`, so
/// tearing down the transport queue releases every waiter.
#[derive(Debug)]
pub struct ReceiptHandle {
    tx: watch::Sender<ReceiptState>,
}

impl ReceiptHandle {
    /// Mark the stanza as transmitted. Returns false if the receipt
    /// had already reached a terminal state.
    pub fn resolve_sent(&self) -> bool {
        self.resolve(ReceiptState::Sent)
    }

    /// Mark the stanza as failed. Returns false if the receipt had
    /// already reached a terminal state.
    pub fn resolve_failed(&self) -> bool {
        self.resolve(ReceiptState::Failed)
    }

    // Transition is valid only out of Pending; a terminal state is
    // immutable once set.
    fn resolve(&self, terminal: ReceiptState) -> bool {
        self.tx.send_if_modified(|state| {
            if *state == ReceiptState::Pending {
                *state = terminal;
                true
            } else {
                false
            }
        })
    }
}

impl Drop for ReceiptHandle {
    fn drop(&mut self) {
        self.resolve(ReceiptState::Failed);
    }
}

/// Create a linked handle/receipt pair for one outbound stanza.
pub fn receipt_pair() -> (ReceiptHandle, Receipt) {
    let (tx, rx) = watch::channel(ReceiptState::Pending);
    (ReceiptHandle { tx }, Receipt { rx })
}
