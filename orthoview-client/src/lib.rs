pub mod annotations;
pub mod error;
mod http;
pub mod slices;
pub mod views;

pub use annotations::{
    AnnotationService, AnnotationStore, HttpAnnotationStore, MemoryAnnotationStore,
    POSITION_RETRY_ATTEMPTS,
};
pub use error::ClientError;
pub use slices::{
    load_stacks, synthetic_stacks, HttpFetcher, SliceFetcher, SliceImage, SliceStacks,
};
pub use views::{HttpViewStore, MemoryViewStore, SavedViewService, ViewStore};

/// Convenience result type for the client crate.
pub type Result<T> = std::result::Result<T, ClientError>;
