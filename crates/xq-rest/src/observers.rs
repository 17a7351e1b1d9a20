//! Named error observers.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::warn;

use crate::error::Error;

type Observer = Arc<dyn Fn(&Error) + Send + Sync>;

/// Identifies a registered error handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ErrorHandlerHandle {
    id: u64,
    name: String,
}

impl ErrorHandlerHandle {
    /// The name the handler was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }
}

struct Entry {
    handle: ErrorHandlerHandle,
    observer: Observer,
}

/// Ordered list of callbacks notified of failed resource requests.
///
/// Registering a name that is already present replaces its callback in
/// place and returns the existing handle.
#[derive(Default)]
pub struct ErrorObservers {
    entries: Mutex<Vec<Entry>>,
    next_id: AtomicU64,
}

impl ErrorObservers {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `observer` under `name`.
    pub fn add<F>(&self, name: impl Into<String>, observer: F) -> ErrorHandlerHandle
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        let name = name.into();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = entries.iter_mut().find(|e| e.handle.name == name) {
            entry.observer = Arc::new(observer);
            return entry.handle.clone();
        }

        let handle = ErrorHandlerHandle {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            name,
        };
        entries.push(Entry {
            handle: handle.clone(),
            observer: Arc::new(observer),
        });
        handle
    }

    /// Unregister a handler. Returns false if it was not registered.
    pub fn remove(&self, handle: &ErrorHandlerHandle) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|e| e.handle != *handle);
        entries.len() != before
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call every handler in registration order.
    ///
    /// Handlers run outside the registry lock. A panicking handler is logged
    /// and skipped.
    pub fn notify(&self, error: &Error) {
        let snapshot: Vec<(ErrorHandlerHandle, Observer)> = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|e| (e.handle.clone(), Arc::clone(&e.observer)))
            .collect();

        for (handle, observer) in snapshot {
            if catch_unwind(AssertUnwindSafe(|| observer(error))).is_err() {
                warn!(handler = %handle.name, "Error handler panicked");
            }
        }
    }
}

impl std::fmt::Debug for ErrorObservers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_list()
            .entries(entries.iter().map(|e| &e.handle.name))
            .finish()
    }
}
