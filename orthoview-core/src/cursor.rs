use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::plane::{Axis, Plane};

/// Size of the volume along each axis, in voxels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeDims {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl VolumeDims {
    pub fn new(x: u32, y: u32, z: u32) -> crate::Result<Self> {
        if x == 0 || y == 0 || z == 0 {
            return Err(CoreError::InvalidDimensions { x, y, z });
        }
        Ok(Self { x, y, z })
    }

    pub fn axis_len(self, axis: Axis) -> u32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Number of slices in a plane's stack: the length of its fixed axis.
    pub fn slice_count(self, plane: Plane) -> u32 {
        self.axis_len(plane.fixed_axis())
    }
}

/// Integer voxel cursor into the volume.
///
/// Every component stays within `[0, axis_len)`; all mutation paths clamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VolumeCursor {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl VolumeCursor {
    /// Cursor at the centre of the volume — the starting view.
    pub fn centered(dims: VolumeDims) -> Self {
        Self {
            x: dims.x / 2,
            y: dims.y / 2,
            z: dims.z / 2,
        }
    }

    pub fn component(self, axis: Axis) -> u32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Set one component, clamped to the volume bounds.
    pub fn set_component(&mut self, axis: Axis, value: u32, dims: VolumeDims) {
        let clamped = value.min(dims.axis_len(axis) - 1);
        match axis {
            Axis::X => self.x = clamped,
            Axis::Y => self.y = clamped,
            Axis::Z => self.z = clamped,
        }
    }

    /// Step one component by `delta`, saturating at both volume bounds.
    pub fn step(&mut self, axis: Axis, delta: i32, dims: VolumeDims) {
        let current = self.component(axis) as i64;
        let max = dims.axis_len(axis) as i64 - 1;
        let next = (current + delta as i64).clamp(0, max) as u32;
        self.set_component(axis, next, dims);
    }

    /// Clamp every component to the volume bounds.
    pub fn clamped(self, dims: VolumeDims) -> Self {
        Self {
            x: self.x.min(dims.x - 1),
            y: self.y.min(dims.y - 1),
            z: self.z.min(dims.z - 1),
        }
    }

    /// The slice of `plane`'s stack this cursor selects.
    pub fn slice_index(self, plane: Plane) -> u32 {
        self.component(plane.fixed_axis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims() -> VolumeDims {
        VolumeDims::new(100, 80, 60).unwrap()
    }

    #[test]
    fn zero_axis_rejected() {
        assert!(VolumeDims::new(0, 80, 60).is_err());
        assert!(VolumeDims::new(100, 0, 60).is_err());
        assert!(VolumeDims::new(100, 80, 0).is_err());
    }

    #[test]
    fn centered_cursor() {
        let c = VolumeCursor::centered(dims());
        assert_eq!(c, VolumeCursor { x: 50, y: 40, z: 30 });
    }

    #[test]
    fn step_saturates_at_lower_bound() {
        let d = dims();
        let mut c = VolumeCursor::default();
        for _ in 0..d.z {
            c.step(Axis::Z, -1, d);
        }
        assert_eq!(c.z, 0);
    }

    #[test]
    fn step_saturates_at_upper_bound() {
        let d = dims();
        let mut c = VolumeCursor { x: 0, y: 0, z: d.z - 1 };
        for _ in 0..d.z {
            c.step(Axis::Z, 1, d);
        }
        assert_eq!(c.z, d.z - 1);
    }

    #[test]
    fn set_component_clamps() {
        let d = dims();
        let mut c = VolumeCursor::default();
        c.set_component(Axis::X, 10_000, d);
        assert_eq!(c.x, d.x - 1);
    }

    #[test]
    fn slice_index_follows_fixed_axis() {
        let c = VolumeCursor { x: 5, y: 6, z: 7 };
        assert_eq!(c.slice_index(Plane::Xy), 7);
        assert_eq!(c.slice_index(Plane::Xz), 6);
        assert_eq!(c.slice_index(Plane::Yz), 5);
    }

    #[test]
    fn slice_count_per_plane() {
        let d = dims();
        assert_eq!(d.slice_count(Plane::Xy), 60);
        assert_eq!(d.slice_count(Plane::Xz), 80);
        assert_eq!(d.slice_count(Plane::Yz), 100);
    }
}
