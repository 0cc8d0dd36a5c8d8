//! Error types.
//!
//! Missing references inside a loaded graph are not errors: they are dropped
//! where they are encountered. Only the fetch path and view misuse produce
//! values of these types.

use crate::model::PersonId;

/// Failure of the data-fetch collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Could not parse family tree: {0}")]
    Parse(String),
    #[error("Person '{0}' not found")]
    NotFound(PersonId),
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}

/// Errors raised by [`crate::view::FamilyTreeView`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    #[error("View has not been mounted")]
    NotMounted,
    #[error("No family tree loaded for root '{0}'")]
    UnknownRoot(PersonId),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}
