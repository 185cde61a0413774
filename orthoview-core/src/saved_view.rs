use serde::{Deserialize, Serialize};

use crate::cursor::VolumeCursor;
use crate::plane::PlaneMap;
use crate::transform::{PanOffset, PlaneTransform};

/// Per-user load statistics for one saved view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadStat {
    pub user: String,
    pub count: u32,
    /// Timestamp of the most recent load, in milliseconds since the epoch.
    pub last_load: i64,
}

/// A named snapshot of the viewer camera: the volume cursor plus all three
/// plane transforms, with per-user load analytics.
///
/// Invariant: `load_count == load_stats.iter().map(|s| s.count).sum()`,
/// maintained by [`record_load`](Self::record_load).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedView {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
    pub name: String,
    pub coords: VolumeCursor,
    pub zoom: PlaneMap<f64>,
    pub pan: PlaneMap<PanOffset>,
    pub creator: String,
    pub created_at: i64,
    pub load_count: u32,
    #[serde(default)]
    pub load_stats: Vec<LoadStat>,
}

impl SavedView {
    /// Snapshot the live camera state under `name`. Counters start at zero.
    pub fn capture(
        name: String,
        coords: VolumeCursor,
        transforms: &PlaneMap<PlaneTransform>,
        creator: String,
        created_at: i64,
    ) -> Self {
        Self {
            remote_id: None,
            name,
            coords,
            zoom: transforms.map(|_, t| t.zoom),
            pan: transforms.map(|_, t| t.pan),
            creator,
            created_at,
            load_count: 0,
            load_stats: Vec::new(),
        }
    }

    /// Reassemble the per-plane transforms this snapshot stores.
    pub fn transforms(&self) -> PlaneMap<PlaneTransform> {
        PlaneMap::from_fn(|plane| PlaneTransform {
            pan: self.pan[plane],
            zoom: self.zoom[plane],
        })
    }

    /// Record a load by `user`: bump the total counter and create or update
    /// the user's stats entry.
    pub fn record_load(&mut self, user: &str, now_ms: i64) {
        self.load_count += 1;
        match self.load_stats.iter_mut().find(|s| s.user == user) {
            Some(stat) => {
                stat.count += 1;
                stat.last_load = now_ms;
            }
            None => self.load_stats.push(LoadStat {
                user: user.to_string(),
                count: 1,
                last_load: now_ms,
            }),
        }
    }

    /// How many times `user` has loaded this view.
    pub fn user_count(&self, user: &str) -> u32 {
        self.load_stats
            .iter()
            .find(|s| s.user == user)
            .map_or(0, |s| s.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plane::Plane;

    fn sample() -> SavedView {
        let mut transforms = PlaneMap::<PlaneTransform>::default();
        transforms[Plane::Xz].zoom = 2.0;
        transforms[Plane::Xz].pan = PanOffset { x: 40.0, y: -8.0 };
        SavedView::capture(
            "hippocampus overview".into(),
            VolumeCursor { x: 10, y: 20, z: 30 },
            &transforms,
            "ada".into(),
            1_700_000_000_000,
        )
    }

    #[test]
    fn capture_starts_with_zero_counters() {
        let view = sample();
        assert_eq!(view.load_count, 0);
        assert!(view.load_stats.is_empty());
        assert!(view.remote_id.is_none());
    }

    #[test]
    fn transforms_roundtrip_through_snapshot() {
        let view = sample();
        let transforms = view.transforms();
        assert_eq!(transforms[Plane::Xz].zoom, 2.0);
        assert_eq!(transforms[Plane::Xz].pan, PanOffset { x: 40.0, y: -8.0 });
        assert_eq!(transforms[Plane::Xy], PlaneTransform::default());
    }

    #[test]
    fn record_load_keeps_count_invariant() {
        let mut view = sample();
        view.record_load("ada", 1);
        view.record_load("ada", 2);
        view.record_load("grace", 3);

        assert_eq!(view.load_count, 3);
        assert_eq!(view.load_stats.len(), 2);
        assert_eq!(view.user_count("ada"), 2);
        assert_eq!(view.user_count("grace"), 1);
        let total: u32 = view.load_stats.iter().map(|s| s.count).sum();
        assert_eq!(view.load_count, total);

        let ada = view.load_stats.iter().find(|s| s.user == "ada").unwrap();
        assert_eq!(ada.last_load, 2);
    }

    #[test]
    fn wire_format_uses_camel_case() {
        let mut view = sample();
        view.record_load("ada", 9);
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("loadCount").is_some());
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["loadStats"][0]["lastLoad"], 9);
        assert!(json["zoom"].get("XY").is_some());

        let back: SavedView = serde_json::from_value(json).unwrap();
        assert_eq!(back, view);
    }
}
