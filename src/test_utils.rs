//! Test doubles for the adapter's two collaborators (feature `test-utils`).
//!
//! [`ScriptedClient`] stands in for the client library: results are queued by the test
//! and every primitive call is logged. [`RecordingEngine`] stands in for the
//! transformation engine: behaviour is configured with closures and every call is
//! recorded as an [`EngineEvent`].

mod recording;
mod scripted;

pub use recording::{EngineEvent, RecordingEngine, RecordingState};
pub use scripted::{ClientCall, ScriptedClient, ScriptedConn};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared, append-only log that a test keeps a handle to while the double records.
#[derive(Debug)]
pub struct EventLog<T> {
    inner: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for EventLog<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for EventLog<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T> EventLog<T> {
    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn push(&self, event: T) {
        self.lock().push(event);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of recorded events matching `pred`.
    pub fn count(&self, pred: impl Fn(&T) -> bool) -> usize {
        self.lock().iter().filter(|e| pred(e)).count()
    }
}

impl<T: Clone> EventLog<T> {
    /// Copy of everything recorded so far.
    #[must_use]
    pub fn snapshot(&self) -> Vec<T> {
        self.lock().clone()
    }
}
