use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use folio_core::{Fingerprint, PendingPolicy};

/// Tracks which fingerprints have a remote write outstanding.
///
/// With [`PendingPolicy::Allow`] it only counts; with
/// [`PendingPolicy::RejectWhilePending`] a second `begin` for a busy
/// fingerprint is refused.
#[derive(Clone, Debug, Default)]
pub struct InFlightRegistry {
    policy: PendingPolicy,
    pending: Arc<Mutex<HashMap<Fingerprint, u32>>>,
}

impl InFlightRegistry {
    pub fn new(policy: PendingPolicy) -> Self {
        Self { policy, pending: Arc::default() }
    }

    pub fn policy(&self) -> PendingPolicy {
        self.policy
    }

    /// `None` when the policy refuses the request.
    pub fn begin(&self, fingerprint: &Fingerprint) -> Option<InFlightGuard> {
        let mut pending = self.lock();
        let count = pending.entry(fingerprint.clone()).or_insert(0);
        if *count > 0 && self.policy == PendingPolicy::RejectWhilePending {
            return None;
        }
        *count += 1;
        Some(InFlightGuard { fingerprint: fingerprint.clone(), pending: Arc::clone(&self.pending) })
    }

    pub fn in_flight(&self, fingerprint: &Fingerprint) -> u32 {
        self.lock().get(fingerprint).copied().unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Fingerprint, u32>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases its fingerprint when dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    fingerprint: Fingerprint,
    pending: Arc<Mutex<HashMap<Fingerprint, u32>>>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(count) = pending.get_mut(&self.fingerprint) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                pending.remove(&self.fingerprint);
            }
        }
    }
}
