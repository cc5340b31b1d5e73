use std::future::Future;
use std::pin::Pin;

use folio_core::{Fingerprint, RegionId, RemoteError, Transition};

pub type RemoteCall<T> = Pin<Box<dyn Future<Output = Result<T, RemoteError>> + Send + 'static>>;

type RemoteFn<T> = Box<dyn FnOnce() -> RemoteCall<T> + Send + 'static>;
type StateFn<S> = Box<dyn FnOnce(&S) -> S + Send + 'static>;

/// One user-initiated state change, created on interaction and dropped after
/// its outcome is reconciled.
pub struct MutationRequest<S, T> {
    pub(crate) fingerprint: Fingerprint,
    pub(crate) remote: RemoteFn<T>,
    pub(crate) apply: StateFn<S>,
    pub(crate) rollback: StateFn<S>,
    pub(crate) invalidates: Vec<RegionId>,
}

impl<S, T> MutationRequest<S, T> {
    /// `remote` is not invoked until the optimistic apply has run.
    pub fn new<R, Fut, A, B>(fingerprint: Fingerprint, remote: R, apply: A, rollback: B) -> Self
    where
        R: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, RemoteError>> + Send + 'static,
        A: FnOnce(&S) -> S + Send + 'static,
        B: FnOnce(&S) -> S + Send + 'static,
    {
        Self {
            fingerprint,
            remote: Box::new(move || Box::pin(remote()) as RemoteCall<T>),
            apply: Box::new(apply),
            rollback: Box::new(rollback),
            invalidates: vec![],
        }
    }

    pub fn from_transition<Tr, R, Fut>(fingerprint: Fingerprint, transition: Tr, remote: R) -> Self
    where
        Tr: Transition<S> + Clone + Send + 'static,
        R: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, RemoteError>> + Send + 'static,
    {
        let undo = transition.clone();
        Self::new(fingerprint, remote, move |s: &S| transition.apply(s), move |s: &S| undo.rollback(s))
    }

    /// Mark `region` stale once the remote write commits.
    pub fn invalidate(mut self, region: RegionId) -> Self {
        self.invalidates.push(region);
        self
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn invalidates(&self) -> &[RegionId] {
        &self.invalidates
    }
}
