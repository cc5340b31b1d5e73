use thiserror::Error;

use crate::Fingerprint;

/// Failure reported by the remote store or by the mutation pipeline.
///
/// Every variant carries a message that can be shown to a user as-is.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("network error: {0}")]
    Network(String),
    #[error("not authorized: {0}")]
    Unauthorized(String),
    #[error("constraint violation: {0}")]
    Constraint(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("mutation already in flight: {0}")]
    Pending(Fingerprint),
    #[error("{0}")]
    Other(String),
}

impl RemoteError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn constraint(message: impl Into<String>) -> Self {
        Self::Constraint(message.into())
    }
}
