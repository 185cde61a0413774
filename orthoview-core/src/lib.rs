pub mod annotation;
pub mod cursor;
pub mod error;
pub mod mapping;
pub mod measure;
pub mod plane;
pub mod saved_view;
pub mod transform;

// Re-export primary types for convenience.
pub use annotation::{is_remote_id, Annotation, AnnotationStatus};
pub use cursor::{VolumeCursor, VolumeDims};
pub use error::CoreError;
pub use mapping::{PlaneGeometry, RasterDims};
pub use measure::{distance_microns, MeasureLine, MeasurePoint, Measurements};
pub use plane::{Axis, Plane, PlaneMap};
pub use saved_view::{LoadStat, SavedView};
pub use transform::{PanOffset, PlaneTransform, MAX_ZOOM, MIN_ZOOM};

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
