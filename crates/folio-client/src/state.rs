use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use folio_core::{MutationPhase, Snapshot};

/// Optimistic state owned by one UI component instance.
///
/// Clones share the same state. Every method takes the lock for a single
/// synchronous step and never across an await.
#[derive(Debug)]
pub struct LocalState<S> {
    inner: Arc<Mutex<Snapshot<S>>>,
}

impl<S> Clone for LocalState<S> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<S: Clone> LocalState<S> {
    pub fn new(value: S) -> Self {
        Self { inner: Arc::new(Mutex::new(Snapshot::new(value))) }
    }

    pub fn get(&self) -> S {
        self.lock().value.clone()
    }

    pub fn snapshot(&self) -> Snapshot<S> {
        self.lock().clone()
    }

    pub fn phase(&self) -> MutationPhase {
        self.lock().phase
    }

    /// Replace the value from fresh remote data. Phase and in-flight count are kept.
    pub fn set(&self, value: S) {
        self.lock().value = value;
    }

    pub fn apply(&self, f: impl FnOnce(&S) -> S) {
        let mut guard = self.lock();
        *guard = guard.apply(f);
    }

    pub fn commit(&self) {
        let mut guard = self.lock();
        *guard = guard.commit();
    }

    pub fn rollback(&self, f: impl FnOnce(&S) -> S) {
        let mut guard = self.lock();
        *guard = guard.rollback(f);
    }

    fn lock(&self) -> MutexGuard<'_, Snapshot<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
