use serde::{Deserialize, Serialize};

/// Where a single mutation is in its lifecycle.
///
/// `Applied` is the only transient phase; every invocation ends in exactly one
/// of `Committed` or `RolledBack`.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MutationPhase {
    #[default]
    Idle,
    Applied,
    Committed,
    RolledBack,
}

impl MutationPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MutationPhase::Committed | MutationPhase::RolledBack)
    }
}

/// What happens when a request arrives for a fingerprint that is already in flight.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PendingPolicy {
    /// Run every request independently; the last remote completion wins.
    #[default]
    Allow,
    /// Refuse the second request before applying anything.
    RejectWhilePending,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}
