//! Observable value cells
//!
//! A [`Cell`] is a shared mutable value with change notification. It is
//! the state primitive behind the form buffers and the displayed list:
//! readers call [`Cell::get`], writers call [`Cell::set`] or
//! [`Cell::update`], and front ends re-render on [`Cell::subscribe`].
//!
//! Cells are backed by a `tokio::sync::watch` channel, so every clone
//! of a cell observes the same value and a subscriber only ever sees
//! the latest value.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Shared observable value
pub struct Cell<T> {
    tx: Arc<watch::Sender<T>>,
}

impl<T> Cell<T> {
    /// Create a cell holding `value`
    pub fn new(value: T) -> Self {
        let (tx, _rx) = watch::channel(value);
        Self { tx: Arc::new(tx) }
    }

    /// Replace the value and notify subscribers
    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Replace the value with one computed from the previous value
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        self.tx.send_modify(|value| *value = f(value));
    }

    /// Read the value without cloning it
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Receiver notified on every write
    ///
    /// The current value counts as already seen.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<T: Clone> Cell<T> {
    /// Current value
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }
}

impl<T: Clone + Send + Sync + 'static> Cell<T> {
    /// Stream of the values set after this call
    ///
    /// Rapid sets may be coalesced into the latest one. The stream ends
    /// once every clone of the cell is dropped and the last value is seen.
    pub fn changes(&self) -> WatchStream<T> {
        WatchStream::from_changes(self.tx.subscribe())
    }
}

impl<T> Clone for Cell<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T: Default> Default for Cell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Cell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cell").field(&*self.tx.borrow()).finish()
    }
}
