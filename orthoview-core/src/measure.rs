use crate::error::CoreError;
use crate::plane::{Plane, PlaneMap};

/// A measurement endpoint in plane-pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurePoint {
    pub x: f64,
    pub y: f64,
}

/// A completed measurement: two endpoints and the physical distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasureLine {
    pub p1: MeasurePoint,
    pub p2: MeasurePoint,
    /// Euclidean pixel distance scaled to microns.
    pub dist: f64,
}

/// Physical distance between two plane-pixel points, in microns.
pub fn distance_microns(p1: MeasurePoint, p2: MeasurePoint, microns_per_pixel: f64) -> f64 {
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    (dx * dx + dy * dy).sqrt() * microns_per_pixel
}

/// Transient measurement state across all three planes.
///
/// Points accumulate per plane; every second point closes a line. Nothing
/// here is persisted — toggling measurement mode off wipes the lot.
#[derive(Debug, Clone)]
pub struct Measurements {
    microns_per_pixel: f64,
    points: PlaneMap<Vec<MeasurePoint>>,
    lines: PlaneMap<Vec<MeasureLine>>,
}

impl Measurements {
    /// `microns_per_pixel` is the dataset's physical calibration, injected
    /// at construction rather than read from a global.
    pub fn new(microns_per_pixel: f64) -> crate::Result<Self> {
        if microns_per_pixel <= 0.0 || !microns_per_pixel.is_finite() {
            return Err(CoreError::InvalidScale(microns_per_pixel));
        }
        Ok(Self {
            microns_per_pixel,
            points: PlaneMap::default(),
            lines: PlaneMap::default(),
        })
    }

    pub fn microns_per_pixel(&self) -> f64 {
        self.microns_per_pixel
    }

    /// Record a click on `plane`. Returns the line it completed, if any.
    pub fn add_point(&mut self, plane: Plane, point: MeasurePoint) -> Option<MeasureLine> {
        let points = &mut self.points[plane];
        points.push(point);
        if points.len() % 2 != 0 {
            return None;
        }
        let p1 = points[points.len() - 2];
        let line = MeasureLine {
            p1,
            p2: point,
            dist: distance_microns(p1, point, self.microns_per_pixel),
        };
        self.lines[plane].push(line);
        Some(line)
    }

    pub fn lines(&self, plane: Plane) -> &[MeasureLine] {
        &self.lines[plane]
    }

    /// The dangling first endpoint of an unfinished pair, if any.
    pub fn pending(&self, plane: Plane) -> Option<MeasurePoint> {
        let points = &self.points[plane];
        if points.len() % 2 == 1 {
            points.last().copied()
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        Plane::ALL
            .iter()
            .all(|&p| self.points[p].is_empty() && self.lines[p].is_empty())
    }

    /// Drop every point and line on every plane.
    pub fn clear(&mut self) {
        for plane in Plane::ALL {
            self.points[plane].clear();
            self.lines[plane].clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn invalid_scale_rejected() {
        assert!(Measurements::new(0.0).is_err());
        assert!(Measurements::new(-0.5).is_err());
        assert!(Measurements::new(f64::NAN).is_err());
    }

    #[test]
    fn two_clicks_make_a_scaled_line() {
        let mut m = Measurements::new(0.5).unwrap();
        assert!(m
            .add_point(Plane::Xy, MeasurePoint { x: 0.0, y: 0.0 })
            .is_none());
        let line = m
            .add_point(Plane::Xy, MeasurePoint { x: 10.0, y: 0.0 })
            .expect("second point closes a line");
        assert!((line.dist - 5.0).abs() < EPSILON);
        assert_eq!(m.lines(Plane::Xy).len(), 1);
    }

    #[test]
    fn pending_tracks_odd_point() {
        let mut m = Measurements::new(1.0).unwrap();
        assert!(m.pending(Plane::Xz).is_none());
        m.add_point(Plane::Xz, MeasurePoint { x: 3.0, y: 4.0 });
        assert_eq!(m.pending(Plane::Xz), Some(MeasurePoint { x: 3.0, y: 4.0 }));
        m.add_point(Plane::Xz, MeasurePoint { x: 0.0, y: 0.0 });
        assert!(m.pending(Plane::Xz).is_none());
    }

    #[test]
    fn planes_accumulate_independently() {
        let mut m = Measurements::new(1.0).unwrap();
        m.add_point(Plane::Xy, MeasurePoint { x: 0.0, y: 0.0 });
        m.add_point(Plane::Xy, MeasurePoint { x: 3.0, y: 4.0 });
        m.add_point(Plane::Yz, MeasurePoint { x: 1.0, y: 1.0 });
        assert_eq!(m.lines(Plane::Xy).len(), 1);
        assert!((m.lines(Plane::Xy)[0].dist - 5.0).abs() < EPSILON);
        assert!(m.lines(Plane::Yz).is_empty());
        assert!(m.pending(Plane::Yz).is_some());
    }

    #[test]
    fn clear_wipes_every_plane() {
        let mut m = Measurements::new(2.0).unwrap();
        for plane in Plane::ALL {
            m.add_point(plane, MeasurePoint { x: 0.0, y: 0.0 });
            m.add_point(plane, MeasurePoint { x: 1.0, y: 1.0 });
            m.add_point(plane, MeasurePoint { x: 2.0, y: 2.0 });
        }
        assert!(!m.is_empty());
        m.clear();
        assert!(m.is_empty());
        for plane in Plane::ALL {
            assert!(m.lines(plane).is_empty());
            assert!(m.pending(plane).is_none());
        }
    }
}
