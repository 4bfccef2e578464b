//! One shot signalling between threads.
//!
//! Two primitives cover the bridge's blocking points. A completion
//! signal carries one value from the owning thread back to a caller
//! parked in a blocking call, used for the construction handshake and
//! hibernate acknowledgments. The closed latch is fired exactly once at
//! destroy and releases every waiter, no matter whether they started
//! waiting before or after the fact.

use std::sync::{Condvar, Mutex};

use crossbeam_channel::{bounded, Receiver, Sender};

/// Creates a connected signal and wait pair with room for one value.
pub fn completion_signal<T>() -> (CompletionSignal<T>, CompletionWait<T>) {
    let (tx, rx) = bounded(1);
    (CompletionSignal { tx }, CompletionWait { rx })
}

/// Sender half of a single use handshake.
pub struct CompletionSignal<T> {
    tx: Sender<T>,
}

impl<T> Clone for CompletionSignal<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> CompletionSignal<T> {
    /// Delivers the result. Only the first completion on any clone
    /// lands, later ones are dropped.
    pub fn complete(&self, value: T) {
        let _ = self.tx.try_send(value);
    }
}

/// Receiver half of a single use handshake.
pub struct CompletionWait<T> {
    rx: Receiver<T>,
}

impl<T> CompletionWait<T> {
    /// Blocks until the paired signal fires. None when every signal
    /// handle was dropped without completing.
    pub fn wait(self) -> Option<T> {
        self.rx.recv().ok()
    }
}

/// A fire once gate any number of threads can wait on.
#[derive(Default)]
pub struct ClosedLatch {
    fired: Mutex<bool>,
    cv: Condvar,
}

impl ClosedLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the gate and wakes every waiter. Idempotent.
    pub fn fire(&self) {
        let mut fired = self.fired.lock().unwrap();
        *fired = true;
        self.cv.notify_all();
    }

    /// Parks until the gate opens. Returns immediately once fired.
    pub fn wait(&self) {
        let mut fired = self.fired.lock().unwrap();
        while !*fired {
            fired = self.cv.wait(fired).unwrap();
        }
    }

    pub fn is_fired(&self) -> bool {
        *self.fired.lock().unwrap()
    }
}
