//! An external signal that stops a run from launching further steps

use std::future;

use tokio::sync::watch;

/// The sending half of a cancellation signal
#[derive(Debug)]
pub struct CancelHandle {
    /// Flips to `true` once cancellation is requested
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    /// Request cancellation of every run observing the paired signal
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

/// The observing half of a cancellation signal
#[derive(Clone, Debug)]
pub struct CancelSignal {
    /// The watched cancellation flag
    receiver: watch::Receiver<bool>,
}

impl CancelSignal {
    /// A signal that is never raised
    pub fn never() -> Self {
        let (_, signal) = cancel_pair();
        signal
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once cancellation is requested; never resolves if the handle
    /// is dropped without cancelling
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        loop {
            if *receiver.borrow_and_update() {
                return;
            }
            if receiver.changed().await.is_err() {
                return future::pending().await;
            }
        }
    }
}

/// Create a connected cancellation handle and signal
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (sender, receiver) = watch::channel(false);
    (CancelHandle { sender }, CancelSignal { receiver })
}
