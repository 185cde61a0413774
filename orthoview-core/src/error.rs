use thiserror::Error;

/// Errors originating from the core coordinate engine.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid volume dimensions: {x}\u{d7}{y}\u{d7}{z} (every axis must be > 0)")]
    InvalidDimensions { x: u32, y: u32, z: u32 },

    #[error("invalid raster dimensions: {width}\u{d7}{height}")]
    InvalidRaster { width: u32, height: u32 },

    #[error("invalid microns-per-pixel scale: {0} (must be positive and finite)")]
    InvalidScale(f64),
}
