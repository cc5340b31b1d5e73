//! Optimistic mutation execution.
//!
//! `submit` applies the optimistic transition before returning, then hands the
//! remote write to the runtime. The outcome is reconciled when the write
//! completes: commit plus cache invalidation on success, rollback on failure.
//!
//! There is no timeout, retry or cancellation. Dropping a [`PendingMutation`]
//! does not stop the write; reconciliation still runs against the state
//! holder. Requests sharing a fingerprint are not serialized unless the
//! executor was built with [`PendingPolicy::RejectWhilePending`]; otherwise the
//! last remote completion decides the final local state.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use folio_core::{Fingerprint, MutationOutcome, PendingPolicy, RemoteError};
use tokio::task::JoinHandle;
use tracing::{debug, info_span, warn, Instrument};

use crate::{InFlightRegistry, LocalState, MutationRequest, QueryCache};

pub struct OptimisticMutationExecutor {
    cache: Arc<QueryCache>,
    registry: InFlightRegistry,
}

impl OptimisticMutationExecutor {
    pub fn new(cache: Arc<QueryCache>) -> Self {
        Self::with_policy(cache, PendingPolicy::Allow)
    }

    pub fn with_policy(cache: Arc<QueryCache>, policy: PendingPolicy) -> Self {
        Self { cache, registry: InFlightRegistry::new(policy) }
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn registry(&self) -> &InFlightRegistry {
        &self.registry
    }

    /// Apply `request` to `state` now and start its remote write.
    ///
    /// Must be called inside a tokio runtime. When the returned future is
    /// first polled the write may already be running.
    pub fn submit<S, T>(&self, state: &LocalState<S>, request: MutationRequest<S, T>) -> PendingMutation<T>
    where
        S: Clone + Send + 'static,
        T: Send + 'static,
    {
        let MutationRequest { fingerprint, remote, apply, rollback, invalidates } = request;

        let Some(guard) = self.registry.begin(&fingerprint) else {
            warn!(fingerprint = %fingerprint, "mutation rejected; another one is in flight");
            let err = RemoteError::Pending(fingerprint.clone());
            return PendingMutation { fingerprint, task: None, ready: Some(MutationOutcome::RolledBack(err)) };
        };

        state.apply(apply);
        debug!(fingerprint = %fingerprint, "optimistic state applied");

        let span = info_span!("mutation", fingerprint = %fingerprint);
        let state = state.clone();
        let cache = Arc::clone(&self.cache);
        let task = tokio::spawn(
            async move {
                let outcome = match remote().await {
                    Ok(value) => {
                        state.commit();
                        for region in &invalidates {
                            cache.invalidate(region);
                        }
                        debug!(invalidated = invalidates.len(), "mutation committed");
                        MutationOutcome::Committed(value)
                    }
                    Err(err) => {
                        state.rollback(rollback);
                        warn!(error = %err, "remote write failed; rolled back");
                        MutationOutcome::RolledBack(err)
                    }
                };
                drop(guard);
                outcome
            }
            .instrument(span),
        );

        PendingMutation { fingerprint, task: Some(task), ready: None }
    }

    /// `submit` and wait for the outcome.
    pub async fn execute<S, T>(&self, state: &LocalState<S>, request: MutationRequest<S, T>) -> MutationOutcome<T>
    where
        S: Clone + Send + 'static,
        T: Send + 'static,
    {
        self.submit(state, request).await
    }
}

/// Outcome of a submitted mutation, resolved when the remote write completes.
pub struct PendingMutation<T> {
    fingerprint: Fingerprint,
    task: Option<JoinHandle<MutationOutcome<T>>>,
    ready: Option<MutationOutcome<T>>,
}

// Never pin-projects into `T`.
impl<T> Unpin for PendingMutation<T> {}

impl<T> PendingMutation<T> {
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |t| t.is_finished())
    }
}

impl<T> Future for PendingMutation<T> {
    type Output = MutationOutcome<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if let Some(outcome) = this.ready.take() {
            return Poll::Ready(outcome);
        }
        let Some(task) = this.task.as_mut() else {
            return Poll::Ready(MutationOutcome::RolledBack(RemoteError::Other(format!(
                "mutation {} polled after completion",
                this.fingerprint
            ))));
        };
        match Pin::new(task).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(res) => {
                this.task = None;
                Poll::Ready(res.unwrap_or_else(|join_err| {
                    MutationOutcome::RolledBack(RemoteError::Other(format!(
                        "mutation {} aborted: {join_err}",
                        this.fingerprint
                    )))
                }))
            }
        }
    }
}
