use orthoview_core::Plane;
use thiserror::Error;

/// Errors originating from slice loading and remote persistence.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A slice image failed to fetch or decode. Fatal to session start:
    /// the slice store is all-or-nothing and never retries.
    #[error("failed to load slice {index:03} of plane {plane}")]
    SliceLoad {
        plane: Plane,
        index: u32,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The remote store rejected a create/update/delete. Non-blocking;
    /// surfaced once and retried only by a new user action.
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// The remote store does not know the identifier. The only class the
    /// annotation position-update path retries.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rejected before any network call.
    #[error("validation failure: {0}")]
    Validation(String),

    #[error(transparent)]
    Core(#[from] orthoview_core::CoreError),
}

impl ClientError {
    /// Whether this failure blocks the session (as opposed to a dismissible
    /// message).
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SliceLoad { .. })
    }
}
