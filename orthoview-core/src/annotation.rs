use serde::{Deserialize, Serialize};

use crate::plane::Plane;

/// Length of a remote store identifier.
pub const REMOTE_ID_LEN: usize = 24;

/// True when `id` matches the remote store's 24-hex-character identifier
/// format. Position-only updates are refused up front when this fails,
/// before any network traffic.
pub fn is_remote_id(id: &str) -> bool {
    id.len() == REMOTE_ID_LEN && id.bytes().all(|b| b.is_ascii_hexdigit())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationStatus {
    Active,
    Deleted,
}

/// A text annotation anchored to a sub-pixel position on one plane's slice.
///
/// `(x, y)` are plane-pixel coordinates, not screen coordinates, so the
/// anchor survives pan/zoom changes and reloads. `id` is the session-local
/// key used while the record is pending; the store assigns `remote_id` on
/// first create, and "has a remote id" is the sole create-vs-modify signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: u64,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
    #[serde(rename = "view")]
    pub plane: Plane,
    pub slice: u32,
    pub x: f64,
    pub y: f64,
    pub text: String,
    #[serde(default)]
    pub instance: u32,
    #[serde(rename = "datetime")]
    pub datetime_ms: i64,
    pub user: String,
    #[serde(rename = "datasetId")]
    pub dataset_id: String,
    pub status: AnnotationStatus,
}

impl Annotation {
    /// A fresh, not-yet-persisted annotation with empty text, awaiting the
    /// user's first edit.
    #[allow(clippy::too_many_arguments)]
    pub fn pending(
        id: u64,
        plane: Plane,
        slice: u32,
        x: f64,
        y: f64,
        user: String,
        dataset_id: String,
        datetime_ms: i64,
    ) -> Self {
        Self {
            id,
            remote_id: None,
            plane,
            slice,
            x,
            y,
            text: String::new(),
            instance: 0,
            datetime_ms,
            user,
            dataset_id,
            status: AnnotationStatus::Active,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.remote_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_id_format() {
        assert!(is_remote_id("5f4dcc3b5aa765d61d8327de"));
        assert!(is_remote_id("ABCDEF0123456789abcdef01"));
        assert!(!is_remote_id("5f4dcc3b5aa765d61d8327d")); // 23 chars
        assert!(!is_remote_id("5f4dcc3b5aa765d61d8327dez")); // 25 chars
        assert!(!is_remote_id("5f4dcc3b5aa765d61d8327dg")); // non-hex
        assert!(!is_remote_id(""));
    }

    #[test]
    fn pending_annotation_is_unpersisted_and_active() {
        let a = Annotation::pending(
            7,
            Plane::Xy,
            12,
            10.0,
            20.0,
            "ada".into(),
            "ds-1".into(),
            1_700_000_000_000,
        );
        assert!(!a.is_persisted());
        assert_eq!(a.status, AnnotationStatus::Active);
        assert!(a.text.is_empty());
    }

    #[test]
    fn wire_format_uses_source_field_names() {
        let mut a = Annotation::pending(
            1,
            Plane::Yz,
            3,
            1.5,
            2.5,
            "ada".into(),
            "ds-1".into(),
            42,
        );
        a.text = "soma".into();
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["view"], "YZ");
        assert_eq!(json["datasetId"], "ds-1");
        assert_eq!(json["datetime"], 42);
        assert_eq!(json["status"], "active");
        assert!(json.get("_id").is_none());

        a.remote_id = Some("5f4dcc3b5aa765d61d8327de".into());
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["_id"], "5f4dcc3b5aa765d61d8327de");
    }
}
