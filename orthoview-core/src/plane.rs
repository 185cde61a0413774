use serde::{Deserialize, Serialize};

/// One axis of the volume-index coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// One of the three orthogonal slice projections of the volume.
///
/// Each plane exposes two volume axes (horizontal, then vertical) and fixes
/// the third: XY fixes `z`, XZ fixes `y`, YZ fixes `x`. The fixed axis
/// selects which slice of the plane's stack is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Plane {
    Xy,
    Xz,
    Yz,
}

impl Plane {
    pub const ALL: [Plane; 3] = [Plane::Xy, Plane::Xz, Plane::Yz];

    pub fn label(self) -> &'static str {
        match self {
            Self::Xy => "XY",
            Self::Xz => "XZ",
            Self::Yz => "YZ",
        }
    }

    /// Path segment used by the slice image source.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Xy => "xy",
            Self::Xz => "xz",
            Self::Yz => "yz",
        }
    }

    /// The two volume axes this plane exposes, as (horizontal, vertical).
    pub fn axes(self) -> (Axis, Axis) {
        match self {
            Self::Xy => (Axis::X, Axis::Y),
            Self::Xz => (Axis::X, Axis::Z),
            Self::Yz => (Axis::Y, Axis::Z),
        }
    }

    /// The volume axis this plane fixes.
    pub fn fixed_axis(self) -> Axis {
        match self {
            Self::Xy => Axis::Z,
            Self::Xz => Axis::Y,
            Self::Yz => Axis::X,
        }
    }
}

impl std::fmt::Display for Plane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-plane storage keyed by [`Plane`].
///
/// The three panels carry near-identical state (transforms, slice stacks,
/// measurement lists); keeping them in one indexed container avoids
/// triplicating every access path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct PlaneMap<T> {
    pub xy: T,
    pub xz: T,
    pub yz: T,
}

impl<T> PlaneMap<T> {
    /// Build a map by evaluating `f` once per plane.
    pub fn from_fn(mut f: impl FnMut(Plane) -> T) -> Self {
        Self {
            xy: f(Plane::Xy),
            xz: f(Plane::Xz),
            yz: f(Plane::Yz),
        }
    }

    pub fn get(&self, plane: Plane) -> &T {
        match plane {
            Plane::Xy => &self.xy,
            Plane::Xz => &self.xz,
            Plane::Yz => &self.yz,
        }
    }

    pub fn get_mut(&mut self, plane: Plane) -> &mut T {
        match plane {
            Plane::Xy => &mut self.xy,
            Plane::Xz => &mut self.xz,
            Plane::Yz => &mut self.yz,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Plane, &T)> {
        Plane::ALL.iter().map(move |&p| (p, self.get(p)))
    }

    pub fn map<U>(&self, mut f: impl FnMut(Plane, &T) -> U) -> PlaneMap<U> {
        PlaneMap {
            xy: f(Plane::Xy, &self.xy),
            xz: f(Plane::Xz, &self.xz),
            yz: f(Plane::Yz, &self.yz),
        }
    }
}

impl<T> std::ops::Index<Plane> for PlaneMap<T> {
    type Output = T;

    fn index(&self, plane: Plane) -> &T {
        self.get(plane)
    }
}

impl<T> std::ops::IndexMut<Plane> for PlaneMap<T> {
    fn index_mut(&mut self, plane: Plane) -> &mut T {
        self.get_mut(plane)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_axis_complements_exposed_axes() {
        for plane in Plane::ALL {
            let (h, v) = plane.axes();
            let fixed = plane.fixed_axis();
            assert_ne!(h, v);
            assert_ne!(h, fixed);
            assert_ne!(v, fixed);
        }
    }

    #[test]
    fn plane_serializes_as_uppercase_label() {
        for plane in Plane::ALL {
            let json = serde_json::to_string(&plane).unwrap();
            assert_eq!(json, format!("\"{}\"", plane.label()));
        }
    }

    #[test]
    fn plane_map_roundtrips_with_uppercase_keys() {
        let map = PlaneMap {
            xy: 1.0,
            xz: 2.0,
            yz: 3.0,
        };
        let json = serde_json::to_string(&map).unwrap();
        assert!(json.contains("\"XY\""));
        assert!(json.contains("\"YZ\""));
        let back: PlaneMap<f64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn plane_map_indexing() {
        let mut map = PlaneMap::from_fn(|p| p.label().to_string());
        assert_eq!(map[Plane::Xz], "XZ");
        map[Plane::Yz].push('!');
        assert_eq!(map.get(Plane::Yz), "YZ!");
    }
}
