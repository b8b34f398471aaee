//! Error types for hub session operations.

use super::ids::Iid;
use thiserror::Error;

/// Errors reported by a [`HubSession`](super::HubSession).
#[derive(Debug, Error)]
pub enum HubError {
    /// The repository refused the transaction.
    #[error("Transaction rejected: {0}")]
    WriteRejected(String),

    /// A referenced thing is not in the session cache.
    #[error("Thing not found: {0}")]
    NotFound(Iid),

    /// The session could not reach the repository.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl HubError {
    /// Create a rejected-write error.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::WriteRejected(message.into())
    }
}
