use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use orthoview_core::{is_remote_id, Annotation, AnnotationStatus};

use crate::error::ClientError;
use crate::http;
use crate::Result;

/// How many refetch-and-retry rounds a position update gets when the remote
/// store reports the record missing. Only that class is retried; every
/// other failure is reported once.
pub const POSITION_RETRY_ATTEMPTS: u32 = 3;

const POSITION_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Remote CRUD surface for annotations, scoped to `(user, dataset)` with
/// `status = active`.
pub trait AnnotationStore {
    fn list(&self, dataset_id: &str, user: &str) -> Result<Vec<Annotation>>;
    /// Persist a new record; returns the store-assigned remote identifier.
    fn create(&mut self, annotation: &Annotation) -> Result<String>;
    fn update(&mut self, remote_id: &str, annotation: &Annotation) -> Result<()>;
    fn update_position(&mut self, remote_id: &str, x: f64, y: f64, slice: u32) -> Result<()>;
    fn delete(&mut self, remote_id: &str) -> Result<()>;
}

/// Owns the local annotation list and reconciles it with a remote store.
///
/// The list is authoritative for rendering; mutations go remote-first where
/// an acknowledgement matters (delete) and local-first with refetch
/// rollback where it does not.
pub struct AnnotationService<S> {
    store: S,
    dataset_id: String,
    user: String,
    annotations: Vec<Annotation>,
    next_local_id: u64,
    retry_delay: Duration,
}

impl<S: AnnotationStore> AnnotationService<S> {
    pub fn new(store: S, dataset_id: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            store,
            dataset_id: dataset_id.into(),
            user: user.into(),
            annotations: Vec::new(),
            next_local_id: 1,
            retry_delay: POSITION_RETRY_DELAY,
        }
    }

    /// Shorten the retry delay (tests).
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Allocate a session-local id for a new pending annotation.
    pub fn next_id(&mut self) -> u64 {
        let id = self.next_local_id;
        self.next_local_id += 1;
        id
    }

    /// Replace the local list from the remote store.
    ///
    /// No-ops without an authenticated user. Fails closed: on error the
    /// local list is emptied and the error surfaced to the caller.
    pub fn fetch_all(&mut self) -> Result<()> {
        if self.user.is_empty() {
            debug!("no authenticated user, skipping annotation fetch");
            return Ok(());
        }
        match self.store.list(&self.dataset_id, &self.user) {
            Ok(list) => {
                info!(count = list.len(), "fetched annotations");
                self.annotations = list;
                self.bump_next_id();
                Ok(())
            }
            Err(e) => {
                self.annotations.clear();
                Err(e)
            }
        }
    }

    /// Insert or replace an annotation in the local list by session id,
    /// without touching the store. Used for the optimistic pending record
    /// an annotate-mode click creates.
    pub fn upsert_local(&mut self, annotation: Annotation) {
        match self.annotations.iter_mut().find(|a| a.id == annotation.id) {
            Some(slot) => *slot = annotation,
            None => self.annotations.push(annotation),
        }
    }

    /// Commit an annotation edit.
    ///
    /// Empty trimmed text on a never-persisted record drops it locally with
    /// no network traffic; on a persisted record it deletes remotely.
    /// `position_only` updates require a well-formed remote identifier and
    /// retry the not-found class a bounded number of times.
    pub fn save(&mut self, annotation: Annotation, position_only: bool) -> Result<()> {
        if self.user.is_empty() {
            return Err(ClientError::Validation(
                "annotation changes require an authenticated user".into(),
            ));
        }
        if position_only {
            return self.save_position(annotation);
        }

        if annotation.text.trim().is_empty() {
            return match annotation.remote_id.clone() {
                None => {
                    debug!(id = annotation.id, "dropping pending annotation with empty text");
                    self.remove_local(annotation.id);
                    Ok(())
                }
                Some(rid) => {
                    self.store.delete(&rid)?;
                    self.remove_local(annotation.id);
                    Ok(())
                }
            };
        }

        let mut annotation = annotation;
        match annotation.remote_id.clone() {
            None => {
                let remote_id = self.store.create(&annotation)?;
                info!(id = annotation.id, %remote_id, "annotation persisted");
                annotation.remote_id = Some(remote_id);
                self.upsert_local(annotation);
            }
            Some(rid) => {
                self.store.update(&rid, &annotation)?;
                self.upsert_local(annotation);
            }
        }
        Ok(())
    }

    /// Delete by session id. The local entry goes away only after the
    /// remote store acknowledges; a pending record is simply dropped.
    pub fn delete(&mut self, local_id: u64) -> Result<()> {
        let Some(annotation) = self.annotations.iter().find(|a| a.id == local_id) else {
            return Ok(());
        };
        match annotation.remote_id.clone() {
            None => {
                self.remove_local(local_id);
                Ok(())
            }
            Some(rid) => {
                self.store.delete(&rid)?;
                self.remove_local(local_id);
                Ok(())
            }
        }
    }

    fn save_position(&mut self, annotation: Annotation) -> Result<()> {
        let rid = annotation.remote_id.clone().ok_or_else(|| {
            ClientError::Validation("position update requires a persisted annotation".into())
        })?;
        if !is_remote_id(&rid) {
            return Err(ClientError::Validation(format!(
                "malformed remote identifier: {rid}"
            )));
        }

        let mut attempt = 0;
        loop {
            match self
                .store
                .update_position(&rid, annotation.x, annotation.y, annotation.slice)
            {
                Ok(()) => {
                    self.upsert_local(annotation);
                    return Ok(());
                }
                Err(ClientError::NotFound(_)) if attempt < POSITION_RETRY_ATTEMPTS => {
                    attempt += 1;
                    warn!(remote_id = %rid, attempt, "position update target missing, refetching");
                    // The remote may not have caught up yet; refresh the
                    // local list and try again.
                    if let Ok(list) = self.store.list(&self.dataset_id, &self.user) {
                        self.annotations = list;
                    }
                    std::thread::sleep(self.retry_delay);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn remove_local(&mut self, local_id: u64) {
        self.annotations.retain(|a| a.id != local_id);
    }

    /// Keep session ids ahead of anything the store handed back.
    fn bump_next_id(&mut self) {
        let max = self.annotations.iter().map(|a| a.id).max().unwrap_or(0);
        self.next_local_id = self.next_local_id.max(max + 1);
    }
}

// ---------------------------------------------------------------------------
// HTTP store
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct CreatedId {
    id: String,
}

/// Annotation store backed by the remote REST endpoints.
pub struct HttpAnnotationStore {
    agent: ureq::Agent,
    api_base: String,
}

impl HttpAnnotationStore {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            agent: http::agent(),
            api_base: api_base.into(),
        }
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}/annotations{suffix}", self.api_base)
    }
}

impl AnnotationStore for HttpAnnotationStore {
    fn list(&self, dataset_id: &str, user: &str) -> Result<Vec<Annotation>> {
        let url = self.url(&format!("?dataset={dataset_id}&user={user}"));
        http::get_json(&self.agent, &url)
    }

    fn create(&mut self, annotation: &Annotation) -> Result<String> {
        let created: CreatedId = http::post_json(&self.agent, &self.url(""), annotation)?;
        Ok(created.id)
    }

    fn update(&mut self, remote_id: &str, annotation: &Annotation) -> Result<()> {
        http::put_json(&self.agent, &self.url(&format!("/{remote_id}")), annotation)
    }

    fn update_position(&mut self, remote_id: &str, x: f64, y: f64, slice: u32) -> Result<()> {
        let url = self.url(&format!("/{remote_id}/position"));
        http::put_json(&self.agent, &url, &json!({ "x": x, "y": y, "slice": slice }))
    }

    fn delete(&mut self, remote_id: &str) -> Result<()> {
        http::delete(&self.agent, &self.url(&format!("/{remote_id}")))
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// In-memory annotation store: offline mode and test fixture.
#[derive(Default)]
pub struct MemoryAnnotationStore {
    records: Vec<Annotation>,
    id_seq: u64,
}

impl MemoryAnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn find_mut(&mut self, remote_id: &str) -> Result<&mut Annotation> {
        self.records
            .iter_mut()
            .find(|a| a.remote_id.as_deref() == Some(remote_id))
            .ok_or_else(|| ClientError::NotFound(remote_id.to_string()))
    }
}

impl AnnotationStore for MemoryAnnotationStore {
    fn list(&self, dataset_id: &str, user: &str) -> Result<Vec<Annotation>> {
        Ok(self
            .records
            .iter()
            .filter(|a| {
                a.dataset_id == dataset_id
                    && a.user == user
                    && a.status == AnnotationStatus::Active
            })
            .cloned()
            .collect())
    }

    fn create(&mut self, annotation: &Annotation) -> Result<String> {
        self.id_seq += 1;
        let remote_id = format!("{:024x}", self.id_seq);
        let mut record = annotation.clone();
        record.remote_id = Some(remote_id.clone());
        self.records.push(record);
        Ok(remote_id)
    }

    fn update(&mut self, remote_id: &str, annotation: &Annotation) -> Result<()> {
        let slot = self.find_mut(remote_id)?;
        let keep = slot.remote_id.clone();
        *slot = annotation.clone();
        slot.remote_id = keep;
        Ok(())
    }

    fn update_position(&mut self, remote_id: &str, x: f64, y: f64, slice: u32) -> Result<()> {
        let slot = self.find_mut(remote_id)?;
        slot.x = x;
        slot.y = y;
        slot.slice = slice;
        Ok(())
    }

    fn delete(&mut self, remote_id: &str) -> Result<()> {
        let before = self.records.len();
        self.records
            .retain(|a| a.remote_id.as_deref() != Some(remote_id));
        if self.records.len() == before {
            return Err(ClientError::NotFound(remote_id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orthoview_core::Plane;

    fn service() -> AnnotationService<MemoryAnnotationStore> {
        AnnotationService::new(MemoryAnnotationStore::new(), "ds-1", "ada")
            .with_retry_delay(Duration::ZERO)
    }

    fn pending(service: &mut AnnotationService<MemoryAnnotationStore>, text: &str) -> Annotation {
        let id = service.next_id();
        let mut a = Annotation::pending(id, Plane::Xy, 4, 10.0, 20.0, "ada".into(), "ds-1".into(), 1);
        a.text = text.into();
        service.upsert_local(a.clone());
        a
    }

    #[test]
    fn create_then_fetch_roundtrip() {
        let mut svc = service();
        let a = pending(&mut svc, "T");
        svc.save(a, false).unwrap();

        svc.fetch_all().unwrap();
        let list = svc.annotations();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].text, "T");
        assert_eq!(list[0].plane, Plane::Xy);
        assert_eq!(list[0].slice, 4);
        assert_eq!((list[0].x, list[0].y), (10.0, 20.0));
        assert!(is_remote_id(list[0].remote_id.as_deref().unwrap()));
    }

    #[test]
    fn empty_text_on_pending_record_issues_no_create() {
        let mut svc = service();
        let a = pending(&mut svc, "   ");
        svc.save(a, false).unwrap();
        assert!(svc.annotations().is_empty());
        // Nothing reached the store.
        assert!(svc.store.records.is_empty());
    }

    #[test]
    fn empty_text_on_persisted_record_deletes_remotely() {
        let mut svc = service();
        let a = pending(&mut svc, "soma");
        svc.save(a, false).unwrap();
        let mut saved = svc.annotations()[0].clone();
        saved.text = String::new();
        svc.save(saved, false).unwrap();
        assert!(svc.annotations().is_empty());
        assert!(svc.store.records.is_empty());
    }

    #[test]
    fn position_update_without_remote_id_fails_before_network() {
        let mut svc = service();
        let a = pending(&mut svc, "soma");
        let err = svc.save(a, true).unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[test]
    fn position_update_with_malformed_id_fails_validation() {
        let mut svc = service();
        let mut a = pending(&mut svc, "soma");
        a.remote_id = Some("not-a-hex-identifier".into());
        let err = svc.save(a, true).unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[test]
    fn position_update_moves_the_record() {
        let mut svc = service();
        let a = pending(&mut svc, "soma");
        svc.save(a, false).unwrap();
        let mut moved = svc.annotations()[0].clone();
        moved.x = 33.5;
        moved.y = 44.25;
        svc.save(moved, true).unwrap();
        svc.fetch_all().unwrap();
        assert_eq!((svc.annotations()[0].x, svc.annotations()[0].y), (33.5, 44.25));
    }

    #[test]
    fn position_update_retries_not_found_then_gives_up() {
        let mut svc = service();
        let a = pending(&mut svc, "soma");
        svc.save(a, false).unwrap();
        let mut ghost = svc.annotations()[0].clone();
        // Remove the backing record so every attempt sees NotFound.
        let rid = ghost.remote_id.clone().unwrap();
        svc.store.delete(&rid).unwrap();
        ghost.x += 1.0;
        let err = svc.save(ghost, true).unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }

    #[test]
    fn fetch_all_without_user_is_a_noop() {
        let mut svc = AnnotationService::new(MemoryAnnotationStore::new(), "ds-1", "");
        svc.fetch_all().unwrap();
        assert!(svc.annotations().is_empty());
    }

    #[test]
    fn save_without_user_is_rejected() {
        let mut svc = AnnotationService::new(MemoryAnnotationStore::new(), "ds-1", "");
        let a = Annotation::pending(1, Plane::Xz, 0, 0.0, 0.0, String::new(), "ds-1".into(), 0);
        assert!(matches!(
            svc.save(a, false),
            Err(ClientError::Validation(_))
        ));
    }

    #[test]
    fn delete_requires_remote_ack_before_removing() {
        struct RefusingStore(MemoryAnnotationStore);
        impl AnnotationStore for RefusingStore {
            fn list(&self, d: &str, u: &str) -> Result<Vec<Annotation>> {
                self.0.list(d, u)
            }
            fn create(&mut self, a: &Annotation) -> Result<String> {
                self.0.create(a)
            }
            fn update(&mut self, r: &str, a: &Annotation) -> Result<()> {
                self.0.update(r, a)
            }
            fn update_position(&mut self, r: &str, x: f64, y: f64, s: u32) -> Result<()> {
                self.0.update_position(r, x, y, s)
            }
            fn delete(&mut self, _remote_id: &str) -> Result<()> {
                Err(ClientError::Persistence("refused".into()))
            }
        }

        let mut svc = AnnotationService::new(RefusingStore(MemoryAnnotationStore::new()), "ds-1", "ada");
        let id = svc.next_id();
        let mut a = Annotation::pending(id, Plane::Yz, 1, 2.0, 3.0, "ada".into(), "ds-1".into(), 0);
        a.text = "axon".into();
        svc.upsert_local(a.clone());
        svc.save(a, false).unwrap();

        let local_id = svc.annotations()[0].id;
        assert!(svc.delete(local_id).is_err());
        // The local entry survives a refused remote delete.
        assert_eq!(svc.annotations().len(), 1);
    }
}
