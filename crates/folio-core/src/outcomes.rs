use crate::RemoteError;

/// Result of reconciling one optimistic mutation with the remote store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationOutcome<T> {
    Committed(T),
    RolledBack(RemoteError),
}

impl<T> MutationOutcome<T> {
    pub fn is_committed(&self) -> bool {
        matches!(self, MutationOutcome::Committed(_))
    }

    pub fn error(&self) -> Option<&RemoteError> {
        match self {
            MutationOutcome::Committed(_) => None,
            MutationOutcome::RolledBack(e) => Some(e),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> MutationOutcome<U> {
        match self {
            MutationOutcome::Committed(v) => MutationOutcome::Committed(f(v)),
            MutationOutcome::RolledBack(e) => MutationOutcome::RolledBack(e),
        }
    }

    pub fn into_result(self) -> Result<T, RemoteError> {
        match self {
            MutationOutcome::Committed(v) => Ok(v),
            MutationOutcome::RolledBack(e) => Err(e),
        }
    }
}
