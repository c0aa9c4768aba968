//! Cooperative cancellation for in-flight sends.
//!
//! The resolver checks a [`CancelSignal`] between strategies only; a strategy
//! whose backend call has started always runs to completion.

use tokio::sync::watch;

/// Creates a linked guard/signal pair.
pub fn cancellation() -> (CancelGuard, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelGuard { tx, armed: true }, CancelSignal { rx: Some(rx) })
}

/// Cancels the paired [`CancelSignal`] when dropped, unless disarmed first.
#[derive(Debug)]
pub struct CancelGuard {
    tx: watch::Sender<bool>,
    armed: bool,
}

impl CancelGuard {
    /// Cancel now.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Consume the guard without cancelling.
    pub fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if self.armed {
            self.tx.send_replace(true);
        }
    }
}

#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: Option<watch::Receiver<bool>>,
}

impl CancelSignal {
    /// A signal that is never cancelled.
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }
}
