//! Error types for the mapping rules.

use thiserror::Error;

use crate::hub::{HubError, Iid};
use crate::tool::ElementId;

/// Errors produced while mapping between the tool and the hub.
#[derive(Debug, Error)]
pub enum MappingError {
    /// A row names a tool element the project does not hold.
    #[error("Tool element not found: {0}")]
    MissingToolElement(ElementId),

    /// A row names a hub thing the iteration does not hold.
    #[error("Hub thing not found: {0}")]
    MissingHubThing(Iid),

    /// The input does not have the shape the rule expects.
    #[error("Invalid input: {0}")]
    Invalid(String),

    /// No package above a requirement can hold its specification.
    #[error("No requirement specification container for '{0}'")]
    UnresolvedRequirementContainer(String),

    #[error("No open iteration")]
    NoOpenIteration,

    #[error("No current domain of expertise")]
    NoDomain,

    /// The hub session failed.
    #[error("Hub session failed")]
    Hub(#[from] HubError),
}

impl MappingError {
    /// Create an invalid-input error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    /// Whether the failure only concerns the row being mapped.
    ///
    /// Row-local failures skip the row; anything else aborts the transform.
    pub fn is_row_local(&self) -> bool {
        matches!(
            self,
            Self::MissingToolElement(_)
                | Self::MissingHubThing(_)
                | Self::Invalid(_)
                | Self::UnresolvedRequirementContainer(_)
        )
    }

    /// This error and its sources, outermost first, joined for logging.
    pub fn chain(&self) -> String {
        let mut rendered = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            rendered.push_str(": ");
            rendered.push_str(&cause.to_string());
            source = cause.source();
        }
        rendered
    }
}
