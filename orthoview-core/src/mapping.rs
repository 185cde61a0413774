use serde::{Deserialize, Serialize};

use crate::cursor::{VolumeCursor, VolumeDims};
use crate::error::CoreError;
use crate::plane::Plane;

/// Pixel dimensions of one plane's slice raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterDims {
    pub width: u32,
    pub height: u32,
}

impl RasterDims {
    pub fn new(width: u32, height: u32) -> crate::Result<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidRaster { width, height });
        }
        Ok(Self { width, height })
    }
}

/// Geometry of one plane: its raster size plus the volume extents.
///
/// A plane raster need not be voxel-for-voxel — the mapping scales plane
/// pixels by `axis_len / raster_len` and floors to an integer index, so a
/// downsampled tile pyramid still addresses the full volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneGeometry {
    pub plane: Plane,
    pub raster: RasterDims,
    pub volume: VolumeDims,
}

impl PlaneGeometry {
    pub fn new(plane: Plane, raster: RasterDims, volume: VolumeDims) -> Self {
        Self {
            plane,
            raster,
            volume,
        }
    }

    /// Update `cursor` from a plane-pixel position.
    ///
    /// Sets the two axes this plane exposes and leaves the fixed axis
    /// untouched. Input coordinates are clamped to the raster, output
    /// indices to the volume.
    pub fn apply_click(&self, cursor: &mut VolumeCursor, px: f64, py: f64) {
        let (h, v) = self.plane.axes();
        let hx = pixel_to_index(px, self.raster.width, self.volume.axis_len(h));
        let vx = pixel_to_index(py, self.raster.height, self.volume.axis_len(v));
        cursor.set_component(h, hx, self.volume);
        cursor.set_component(v, vx, self.volume);
    }

    /// Project the cursor onto this plane as fractional pixel coordinates.
    ///
    /// Returns the centre of the cursor's voxel so that projecting and then
    /// clicking the same position round-trips to the identical cursor.
    pub fn project(&self, cursor: VolumeCursor) -> (f64, f64) {
        let (h, v) = self.plane.axes();
        (
            index_to_pixel(cursor.component(h), self.raster.width, self.volume.axis_len(h)),
            index_to_pixel(cursor.component(v), self.raster.height, self.volume.axis_len(v)),
        )
    }
}

fn pixel_to_index(pixel: f64, raster_len: u32, axis_len: u32) -> u32 {
    let scaled = pixel.max(0.0) * axis_len as f64 / raster_len as f64;
    (scaled.floor() as u32).min(axis_len - 1)
}

fn index_to_pixel(index: u32, raster_len: u32, axis_len: u32) -> f64 {
    (index as f64 + 0.5) * raster_len as f64 / axis_len as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(plane: Plane) -> PlaneGeometry {
        PlaneGeometry::new(
            plane,
            RasterDims::new(512, 512).unwrap(),
            VolumeDims::new(128, 256, 64).unwrap(),
        )
    }

    #[test]
    fn zero_raster_rejected() {
        assert!(RasterDims::new(0, 512).is_err());
        assert!(RasterDims::new(512, 0).is_err());
    }

    #[test]
    fn xy_click_leaves_z_unchanged() {
        let g = geometry(Plane::Xy);
        let mut cursor = VolumeCursor { x: 0, y: 0, z: 33 };
        g.apply_click(&mut cursor, 256.0, 128.0);
        // 256 px of 512 → half of 128 = 64; 128 px of 512 → quarter of 256 = 64.
        assert_eq!(cursor, VolumeCursor { x: 64, y: 64, z: 33 });
    }

    #[test]
    fn yz_click_maps_horizontal_to_y() {
        let g = geometry(Plane::Yz);
        let mut cursor = VolumeCursor { x: 12, y: 0, z: 0 };
        g.apply_click(&mut cursor, 511.9, 511.9);
        assert_eq!(cursor.x, 12);
        assert_eq!(cursor.y, 255);
        assert_eq!(cursor.z, 63);
    }

    #[test]
    fn click_clamps_out_of_range_input() {
        let g = geometry(Plane::Xy);
        let mut cursor = VolumeCursor::default();
        g.apply_click(&mut cursor, -40.0, 1e6);
        assert_eq!(cursor.x, 0);
        assert_eq!(cursor.y, 255);
    }

    #[test]
    fn project_then_click_is_identity() {
        for plane in Plane::ALL {
            let g = geometry(plane);
            let mut cursor = VolumeCursor { x: 17, y: 201, z: 5 };
            let original = cursor;
            let (px, py) = g.project(cursor);
            g.apply_click(&mut cursor, px, py);
            assert_eq!(cursor, original, "round trip failed on {}", plane.label());
        }
    }

    #[test]
    fn voxel_sized_raster_projects_to_pixel_centers() {
        let g = PlaneGeometry::new(
            Plane::Xy,
            RasterDims::new(128, 256).unwrap(),
            VolumeDims::new(128, 256, 64).unwrap(),
        );
        let (px, py) = g.project(VolumeCursor { x: 10, y: 20, z: 0 });
        assert!((px - 10.5).abs() < 1e-12);
        assert!((py - 20.5).abs() < 1e-12);
    }
}
