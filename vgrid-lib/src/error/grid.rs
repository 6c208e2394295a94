//! Grid error types

use super::ConfigError;
use super::SourceError;
use crate::coordinator::RequestToken;

/// Errors returned by the grid engine.
///
/// Cheap to clone so failures can be forwarded on the grid's event channel
/// as well as returned to the caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    /// The grid was built from an unusable configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The authoritative fetch failed. The cache was left unchanged.
    #[error("Fetch {token} failed: {source}")]
    Fetch {
        /// Token of the failed request.
        token: RequestToken,
        /// The data source's error.
        source: SourceError,
    },

    /// `mount()` was called on a grid that is already mounted.
    #[error("Grid is already mounted")]
    AlreadyMounted,

    /// The operation needs a mounted grid.
    #[error("Grid is not mounted")]
    NotMounted,

    /// The grid has been unmounted and no longer accepts work.
    #[error("Grid has been unmounted")]
    Unmounted,
}

impl GridError {
    /// Returns the data source error if this is a fetch failure.
    pub fn source_error(&self) -> Option<&SourceError> {
        match self {
            Self::Fetch { source, .. } => Some(source),
            _ => None,
        }
    }
}
