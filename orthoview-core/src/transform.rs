use serde::{Deserialize, Serialize};

/// Smallest permitted zoom factor.
pub const MIN_ZOOM: f64 = 0.1;
/// Largest permitted zoom factor.
pub const MAX_ZOOM: f64 = 5.0;

/// Screen-space pan offset in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PanOffset {
    pub x: f64,
    pub y: f64,
}

/// Pan/zoom state for one plane panel.
///
/// `zoom` scales plane pixels to canvas pixels; `pan` is a canvas-pixel
/// offset applied after scaling. Dragging therefore moves the image by the
/// raw pointer delta independent of zoom, which matches direct-manipulation
/// intuition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneTransform {
    pub pan: PanOffset,
    pub zoom: f64,
}

impl Default for PlaneTransform {
    fn default() -> Self {
        Self {
            pan: PanOffset::default(),
            zoom: 1.0,
        }
    }
}

impl PlaneTransform {
    /// Back to identity: no pan, unit zoom.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Multiply the zoom factor, clamped to `[MIN_ZOOM, MAX_ZOOM]`.
    pub fn zoom_by(&mut self, factor: f64) {
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Shift the pan offset by a raw canvas-pixel delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan.x += dx;
        self.pan.y += dy;
    }

    /// Map a plane-pixel coordinate to canvas-local screen coordinates.
    ///
    /// The caller adds the canvas origin; composing with [`to_pixel`]
    /// (ignoring clamping) is the identity to floating-point precision,
    /// which is what keeps annotation anchors visually stable across
    /// pan/zoom changes.
    ///
    /// [`to_pixel`]: Self::to_pixel
    #[inline]
    pub fn to_screen(&self, px: f64, py: f64) -> (f64, f64) {
        (px * self.zoom + self.pan.x, py * self.zoom + self.pan.y)
    }

    /// Inverse of [`to_screen`](Self::to_screen), unclamped.
    #[inline]
    pub fn to_pixel(&self, sx: f64, sy: f64) -> (f64, f64) {
        ((sx - self.pan.x) / self.zoom, (sy - self.pan.y) / self.zoom)
    }

    /// [`to_pixel`](Self::to_pixel) clamped to `[0, width-1] x [0, height-1]`.
    pub fn to_pixel_clamped(&self, sx: f64, sy: f64, width: u32, height: u32) -> (f64, f64) {
        let (px, py) = self.to_pixel(sx, sy);
        (
            px.clamp(0.0, (width - 1) as f64),
            py.clamp(0.0, (height - 1) as f64),
        )
    }
}
