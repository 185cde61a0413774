use serde_json::json;
use tracing::{debug, info};

use orthoview_core::{PlaneMap, PlaneTransform, SavedView, VolumeCursor};

use crate::error::ClientError;
use crate::http;
use crate::Result;

/// Remote CRUD surface for saved views.
pub trait ViewStore {
    fn list(&self) -> Result<Vec<SavedView>>;
    /// Persist a new snapshot; returns the stored record (with remote id).
    fn create(&mut self, view: &SavedView) -> Result<SavedView>;
    /// Fetch a view for restoring, bumping its counters for `user`.
    fn load(&mut self, remote_id: &str, user: &str) -> Result<SavedView>;
    fn rename(&mut self, remote_id: &str, name: &str) -> Result<()>;
    /// Single or bulk delete.
    fn delete(&mut self, remote_ids: &[String]) -> Result<()>;
}

/// Owns the local saved-view list and reconciles it with a remote store.
pub struct SavedViewService<S> {
    store: S,
    user: String,
    views: Vec<SavedView>,
}

impl<S: ViewStore> SavedViewService<S> {
    pub fn new(store: S, user: impl Into<String>) -> Self {
        Self {
            store,
            user: user.into(),
            views: Vec::new(),
        }
    }

    pub fn views(&self) -> &[SavedView] {
        &self.views
    }

    /// Replace the local list from the remote store. Fails closed.
    pub fn fetch_all(&mut self) -> Result<()> {
        match self.store.list() {
            Ok(list) => {
                debug!(count = list.len(), "fetched saved views");
                self.views = list;
                Ok(())
            }
            Err(e) => {
                self.views.clear();
                Err(e)
            }
        }
    }

    /// Snapshot the live camera under `name`. The name must be non-empty
    /// after trimming; counters start at zero.
    pub fn save(
        &mut self,
        name: &str,
        coords: VolumeCursor,
        transforms: &PlaneMap<PlaneTransform>,
        now_ms: i64,
    ) -> Result<SavedView> {
        self.require_user()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ClientError::Validation("view name must not be empty".into()));
        }
        let view = SavedView::capture(
            name.to_string(),
            coords,
            transforms,
            self.user.clone(),
            now_ms,
        );
        let stored = self.store.create(&view)?;
        info!(name, "saved view created");
        self.views.push(stored.clone());
        Ok(stored)
    }

    /// Load a view for restoring: the store bumps `load_count` and the
    /// caller's `load_stats` entry, and the refreshed record replaces the
    /// local copy. Returns the snapshot to apply to the live camera.
    pub fn load(&mut self, remote_id: &str) -> Result<SavedView> {
        self.require_user()?;
        let loaded = self.store.load(remote_id, &self.user)?;
        if let Some(slot) = self
            .views
            .iter_mut()
            .find(|v| v.remote_id.as_deref() == Some(remote_id))
        {
            *slot = loaded.clone();
        }
        info!(name = %loaded.name, count = loaded.load_count, "saved view loaded");
        Ok(loaded)
    }

    /// Rename with the same non-empty validation as save.
    pub fn rename(&mut self, remote_id: &str, new_name: &str) -> Result<()> {
        self.require_user()?;
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(ClientError::Validation("view name must not be empty".into()));
        }
        self.store.rename(remote_id, new_name)?;
        if let Some(view) = self
            .views
            .iter_mut()
            .find(|v| v.remote_id.as_deref() == Some(remote_id))
        {
            view.name = new_name.to_string();
        }
        Ok(())
    }

    /// Delete one or many views; local entries go away after the ack.
    pub fn delete(&mut self, remote_ids: &[String]) -> Result<()> {
        self.require_user()?;
        if remote_ids.is_empty() {
            return Ok(());
        }
        self.store.delete(remote_ids)?;
        self.views
            .retain(|v| !remote_ids.iter().any(|id| v.remote_id.as_deref() == Some(id.as_str())));
        Ok(())
    }

    fn require_user(&self) -> Result<()> {
        if self.user.is_empty() {
            return Err(ClientError::Validation(
                "saved-view changes require an authenticated user".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// HTTP store
// ---------------------------------------------------------------------------

/// Saved-view store backed by the remote REST endpoints. Counter updates
/// happen server-side on the load endpoint.
pub struct HttpViewStore {
    agent: ureq::Agent,
    api_base: String,
}

impl HttpViewStore {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            agent: http::agent(),
            api_base: api_base.into(),
        }
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}/views{suffix}", self.api_base)
    }
}

impl ViewStore for HttpViewStore {
    fn list(&self) -> Result<Vec<SavedView>> {
        http::get_json(&self.agent, &self.url(""))
    }

    fn create(&mut self, view: &SavedView) -> Result<SavedView> {
        http::post_json(&self.agent, &self.url(""), view)
    }

    fn load(&mut self, remote_id: &str, user: &str) -> Result<SavedView> {
        let url = self.url(&format!("/{remote_id}/load?user={user}"));
        let resp = self
            .agent
            .post(&url)
            .send_string("")
            .map_err(|e| http::map_err(e, &url))?;
        let body = resp
            .into_string()
            .map_err(|e| ClientError::Persistence(format!("{url}: {e}")))?;
        serde_json::from_str(&body)
            .map_err(|e| ClientError::Persistence(format!("{url}: malformed response: {e}")))
    }

    fn rename(&mut self, remote_id: &str, name: &str) -> Result<()> {
        http::put_json(
            &self.agent,
            &self.url(&format!("/{remote_id}")),
            &json!({ "name": name }),
        )
    }

    fn delete(&mut self, remote_ids: &[String]) -> Result<()> {
        match remote_ids {
            [single] => http::delete(&self.agent, &self.url(&format!("/{single}"))),
            many => http::post_ack(&self.agent, &self.url("/delete"), &json!({ "ids": many })),
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// In-memory saved-view store: offline mode and test fixture.
#[derive(Default)]
pub struct MemoryViewStore {
    records: Vec<SavedView>,
    id_seq: u64,
}

impl MemoryViewStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn find_mut(&mut self, remote_id: &str) -> Result<&mut SavedView> {
        self.records
            .iter_mut()
            .find(|v| v.remote_id.as_deref() == Some(remote_id))
            .ok_or_else(|| ClientError::NotFound(remote_id.to_string()))
    }
}

impl ViewStore for MemoryViewStore {
    fn list(&self) -> Result<Vec<SavedView>> {
        Ok(self.records.clone())
    }

    fn create(&mut self, view: &SavedView) -> Result<SavedView> {
        self.id_seq += 1;
        let mut record = view.clone();
        record.remote_id = Some(format!("{:024x}", self.id_seq));
        self.records.push(record.clone());
        Ok(record)
    }

    fn load(&mut self, remote_id: &str, user: &str) -> Result<SavedView> {
        let now_ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64;
        let view = self.find_mut(remote_id)?;
        view.record_load(user, now_ms);
        Ok(view.clone())
    }

    fn rename(&mut self, remote_id: &str, name: &str) -> Result<()> {
        self.find_mut(remote_id)?.name = name.to_string();
        Ok(())
    }

    fn delete(&mut self, remote_ids: &[String]) -> Result<()> {
        for id in remote_ids {
            self.find_mut(id)?;
        }
        self.records
            .retain(|v| !remote_ids.iter().any(|id| v.remote_id.as_deref() == Some(id.as_str())));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orthoview_core::{PanOffset, Plane};

    fn service() -> SavedViewService<MemoryViewStore> {
        SavedViewService::new(MemoryViewStore::new(), "ada")
    }

    fn transforms() -> PlaneMap<PlaneTransform> {
        let mut t = PlaneMap::<PlaneTransform>::default();
        t[Plane::Yz].zoom = 3.0;
        t[Plane::Yz].pan = PanOffset { x: -12.0, y: 7.5 };
        t
    }

    #[test]
    fn save_rejects_blank_names() {
        let mut svc = service();
        let cursor = VolumeCursor { x: 1, y: 2, z: 3 };
        assert!(matches!(
            svc.save("   ", cursor, &transforms(), 0),
            Err(ClientError::Validation(_))
        ));
        assert!(svc.views().is_empty());
    }

    #[test]
    fn save_trims_and_starts_counters_at_zero() {
        let mut svc = service();
        let cursor = VolumeCursor { x: 1, y: 2, z: 3 };
        let view = svc.save("  overview  ", cursor, &transforms(), 99).unwrap();
        assert_eq!(view.name, "overview");
        assert_eq!(view.load_count, 0);
        assert!(view.load_stats.is_empty());
        assert!(view.remote_id.is_some());
    }

    #[test]
    fn load_twice_counts_once_per_load_with_single_stat_entry() {
        let mut svc = service();
        let cursor = VolumeCursor { x: 1, y: 2, z: 3 };
        let id = svc
            .save("overview", cursor, &transforms(), 0)
            .unwrap()
            .remote_id
            .clone()
            .unwrap();

        let first = svc.load(&id).unwrap();
        assert_eq!(first.load_count, 1);
        let second = svc.load(&id).unwrap();
        assert_eq!(second.load_count, 2);
        assert_eq!(second.load_stats.len(), 1);
        assert_eq!(second.user_count("ada"), 2);

        // The restored snapshot carries the captured camera.
        assert_eq!(second.coords, cursor);
        assert_eq!(second.transforms()[Plane::Yz].zoom, 3.0);
    }

    #[test]
    fn two_users_get_two_stat_entries() {
        let mut store = MemoryViewStore::new();
        let view = SavedView::capture(
            "shared".into(),
            VolumeCursor::default(),
            &PlaneMap::default(),
            "ada".into(),
            0,
        );
        let id = store.create(&view).unwrap().remote_id.unwrap();
        store.load(&id, "ada").unwrap();
        store.load(&id, "grace").unwrap();
        let loaded = store.load(&id, "ada").unwrap();
        assert_eq!(loaded.load_count, 3);
        assert_eq!(loaded.load_stats.len(), 2);
        let total: u32 = loaded.load_stats.iter().map(|s| s.count).sum();
        assert_eq!(loaded.load_count, total);
    }

    #[test]
    fn rename_validates_and_applies_locally() {
        let mut svc = service();
        let id = svc
            .save("old", VolumeCursor::default(), &PlaneMap::default(), 0)
            .unwrap()
            .remote_id
            .clone()
            .unwrap();
        assert!(matches!(
            svc.rename(&id, "  "),
            Err(ClientError::Validation(_))
        ));
        svc.rename(&id, "new").unwrap();
        assert_eq!(svc.views()[0].name, "new");
    }

    #[test]
    fn bulk_delete_removes_all_named_ids() {
        let mut svc = service();
        let mut ids = Vec::new();
        for name in ["a", "b", "c"] {
            ids.push(
                svc.save(name, VolumeCursor::default(), &PlaneMap::default(), 0)
                    .unwrap()
                    .remote_id
                    .clone()
                    .unwrap(),
            );
        }
        svc.delete(&ids[..2].to_vec()).unwrap();
        assert_eq!(svc.views().len(), 1);
        assert_eq!(svc.views()[0].name, "c");
    }

    #[test]
    fn mutations_require_a_user() {
        let mut svc = SavedViewService::new(MemoryViewStore::new(), "");
        assert!(matches!(
            svc.save("x", VolumeCursor::default(), &PlaneMap::default(), 0),
            Err(ClientError::Validation(_))
        ));
        assert!(matches!(svc.load("0"), Err(ClientError::Validation(_))));
    }
}
