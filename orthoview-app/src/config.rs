use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use orthoview_core::{PlaneMap, PlaneTransform, VolumeCursor, VolumeDims};

// ---------------------------------------------------------------------------
// Last-view snapshot
// ---------------------------------------------------------------------------

/// Camera state captured on exit so the next session reopens where the user
/// left off.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastView {
    pub cursor: VolumeCursor,
    pub transforms: PlaneMap<PlaneTransform>,
}

// ---------------------------------------------------------------------------
// Viewer configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default = "default_window_width")]
    pub window_width: f32,
    #[serde(default = "default_window_height")]
    pub window_height: f32,

    /// Dataset identifier annotation/view scoping is keyed by.
    #[serde(default = "default_dataset_id")]
    pub dataset_id: String,
    /// Opaque authenticated-user identifier. Empty disables annotation and
    /// saved-view mutation.
    #[serde(default = "default_user")]
    pub user: String,

    /// Base URL of the slice tile source. Empty switches to procedural
    /// offline stacks.
    #[serde(default)]
    pub tile_base_url: String,
    /// Base URL of the persistence API. Empty keeps annotations and views
    /// in memory for the session.
    #[serde(default)]
    pub api_base_url: String,

    /// Physical calibration of plane pixels for the measurement tool.
    #[serde(default = "default_microns_per_pixel")]
    pub microns_per_pixel: f64,

    /// Volume extents in voxels.
    #[serde(default = "default_volume_x")]
    pub volume_x: u32,
    #[serde(default = "default_volume_y")]
    pub volume_y: u32,
    #[serde(default = "default_volume_z")]
    pub volume_z: u32,

    #[serde(default = "default_true")]
    pub restore_last_view: bool,
    #[serde(default)]
    pub last_view: Option<LastView>,
}

fn default_window_width() -> f32 {
    1440.0
}
fn default_window_height() -> f32 {
    860.0
}
fn default_dataset_id() -> String {
    "demo".to_string()
}
fn default_user() -> String {
    "demo".to_string()
}
fn default_microns_per_pixel() -> f64 {
    0.5
}
fn default_volume_x() -> u32 {
    256
}
fn default_volume_y() -> u32 {
    256
}
fn default_volume_z() -> u32 {
    128
}
fn default_true() -> bool {
    true
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window_width: default_window_width(),
            window_height: default_window_height(),
            dataset_id: default_dataset_id(),
            user: default_user(),
            tile_base_url: String::new(),
            api_base_url: String::new(),
            microns_per_pixel: default_microns_per_pixel(),
            volume_x: default_volume_x(),
            volume_y: default_volume_y(),
            volume_z: default_volume_z(),
            restore_last_view: true,
            last_view: None,
        }
    }
}

impl ViewerConfig {
    /// Load configuration from the OS config directory, falling back to
    /// defaults on a missing or unparsable file.
    pub fn load() -> Self {
        let path = config_path();
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(json) => match serde_json::from_str::<ViewerConfig>(&json) {
                    Ok(config) => {
                        info!("Loaded configuration from {}", path.display());
                        return config;
                    }
                    Err(e) => error!("Failed to parse configuration: {e}"),
                },
                Err(e) => error!("Failed to read configuration file: {e}"),
            }
        } else {
            debug!("No configuration file at {}", path.display());
        }
        Self::default()
    }

    /// Persist configuration to disk.
    pub fn save(&self) {
        let path = config_path();
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory: {e}");
                return;
            }
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = fs::write(&path, &json) {
                    error!("Failed to write configuration: {e}");
                } else {
                    debug!("Saved configuration");
                }
            }
            Err(e) => error!("Failed to serialize configuration: {e}"),
        }
    }

    /// The configured volume extents, falling back to defaults when a
    /// hand-edited file zeroed an axis.
    pub fn volume_dims(&self) -> VolumeDims {
        VolumeDims::new(self.volume_x, self.volume_y, self.volume_z).unwrap_or_else(|e| {
            error!("Bad volume dimensions in config ({e}), using defaults");
            VolumeDims::new(default_volume_x(), default_volume_y(), default_volume_z())
                .expect("default volume dimensions are valid")
        })
    }
}

fn config_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "OrthoView")
        .map(|d| d.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gets_all_defaults() {
        let config: ViewerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.dataset_id, "demo");
        assert!(config.tile_base_url.is_empty());
        assert!(config.restore_last_view);
        assert_eq!(config.volume_dims().z, 128);
    }

    #[test]
    fn roundtrips_through_json() {
        let mut config = ViewerConfig::default();
        config.user = "ada".into();
        config.last_view = Some(LastView {
            cursor: VolumeCursor { x: 1, y: 2, z: 3 },
            transforms: PlaneMap::default(),
        });
        let json = serde_json::to_string(&config).unwrap();
        let back: ViewerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.user, "ada");
        assert_eq!(back.last_view.unwrap().cursor, VolumeCursor { x: 1, y: 2, z: 3 });
    }

    #[test]
    fn zeroed_volume_axis_falls_back_to_defaults() {
        let config: ViewerConfig = serde_json::from_str(r#"{"volume_x": 0}"#).unwrap();
        let dims = config.volume_dims();
        assert_eq!((dims.x, dims.y, dims.z), (256, 256, 128));
    }
}
