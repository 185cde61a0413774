use std::sync::mpsc;

use eframe::egui;
use tracing::{debug, info};

use orthoview_client::{
    load_stacks, synthetic_stacks, AnnotationService, AnnotationStore, ClientError,
    HttpAnnotationStore, HttpFetcher, HttpViewStore, MemoryAnnotationStore, MemoryViewStore,
    SavedViewService, SliceStacks, ViewStore,
};
use orthoview_core::{Annotation, PlaneMap, PlaneTransform, SavedView, VolumeCursor, VolumeDims};

use crate::config::ViewerConfig;

// ---------------------------------------------------------------------------
// Protocol
// ---------------------------------------------------------------------------

/// Request sent from the UI thread to the network worker.
pub(crate) enum NetRequest {
    LoadSlices,
    FetchAnnotations,
    SaveAnnotation {
        annotation: Annotation,
        position_only: bool,
    },
    DeleteAnnotation {
        local_id: u64,
    },
    FetchViews,
    SaveView {
        name: String,
        coords: VolumeCursor,
        transforms: PlaneMap<PlaneTransform>,
        now_ms: i64,
    },
    LoadView {
        remote_id: String,
    },
    RenameView {
        remote_id: String,
        name: String,
    },
    DeleteViews {
        remote_ids: Vec<String>,
    },
}

/// Response sent from the network worker back to the UI thread.
///
/// Annotation and view responses always carry the worker's authoritative
/// list so the UI can reconcile its optimistic copy, error or not.
pub(crate) enum NetResponse {
    Slices(Result<SliceStacks, ClientError>),
    Annotations {
        error: Option<String>,
        list: Vec<Annotation>,
    },
    Views {
        error: Option<String>,
        list: Vec<SavedView>,
    },
    ViewLoaded(Result<SavedView, String>),
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// Spawn the network worker thread.
///
/// The worker owns the persistence services; store implementations are
/// picked from the config (HTTP endpoints, or in-memory when no API base is
/// configured). Returns the request sender and response receiver.
pub(crate) fn spawn(
    config: &ViewerConfig,
    ctx: egui::Context,
) -> (mpsc::Sender<NetRequest>, mpsc::Receiver<NetResponse>) {
    let (req_tx, req_rx) = mpsc::channel::<NetRequest>();
    let (resp_tx, resp_rx) = mpsc::channel::<NetResponse>();

    let volume = config.volume_dims();
    let fetcher = if config.tile_base_url.is_empty() {
        info!("no tile source configured, using procedural stacks");
        None
    } else {
        Some(HttpFetcher::new(config.tile_base_url.clone()))
    };

    let dataset_id = config.dataset_id.clone();
    let user = config.user.clone();
    let api_base = config.api_base_url.clone();

    std::thread::Builder::new()
        .name("net-worker".into())
        .spawn(move || {
            debug!("network worker started");
            if api_base.is_empty() {
                info!("no persistence API configured, keeping records in memory");
                run(
                    ctx,
                    req_rx,
                    resp_tx,
                    volume,
                    fetcher,
                    AnnotationService::new(MemoryAnnotationStore::new(), dataset_id, user.clone()),
                    SavedViewService::new(MemoryViewStore::new(), user),
                );
            } else {
                run(
                    ctx,
                    req_rx,
                    resp_tx,
                    volume,
                    fetcher,
                    AnnotationService::new(
                        HttpAnnotationStore::new(api_base.clone()),
                        dataset_id,
                        user.clone(),
                    ),
                    SavedViewService::new(HttpViewStore::new(api_base), user),
                );
            }
            debug!("network worker exiting");
        })
        .expect("Failed to spawn network worker thread");

    (req_tx, resp_rx)
}

fn run<A: AnnotationStore, V: ViewStore>(
    ctx: egui::Context,
    rx: mpsc::Receiver<NetRequest>,
    tx: mpsc::Sender<NetResponse>,
    volume: VolumeDims,
    fetcher: Option<HttpFetcher>,
    mut annotations: AnnotationService<A>,
    mut views: SavedViewService<V>,
) {
    while let Ok(request) = rx.recv() {
        let response = match request {
            NetRequest::LoadSlices => {
                let result = match &fetcher {
                    Some(f) => load_stacks(f, volume),
                    None => Ok(synthetic_stacks(volume)),
                };
                NetResponse::Slices(result)
            }

            NetRequest::FetchAnnotations => {
                let error = annotations.fetch_all().err().map(|e| e.to_string());
                annotation_snapshot(&annotations, error)
            }
            NetRequest::SaveAnnotation {
                annotation,
                position_only,
            } => {
                let result = annotations.save(annotation, position_only);
                reconcile_annotations(&mut annotations, result)
            }
            NetRequest::DeleteAnnotation { local_id } => {
                let result = annotations.delete(local_id);
                reconcile_annotations(&mut annotations, result)
            }

            NetRequest::FetchViews => {
                let error = views.fetch_all().err().map(|e| e.to_string());
                view_snapshot(&views, error)
            }
            NetRequest::SaveView {
                name,
                coords,
                transforms,
                now_ms,
            } => {
                let error = views
                    .save(&name, coords, &transforms, now_ms)
                    .err()
                    .map(|e| e.to_string());
                view_snapshot(&views, error)
            }
            NetRequest::LoadView { remote_id } => {
                NetResponse::ViewLoaded(views.load(&remote_id).map_err(|e| e.to_string()))
            }
            NetRequest::RenameView { remote_id, name } => {
                let error = views.rename(&remote_id, &name).err().map(|e| e.to_string());
                view_snapshot(&views, error)
            }
            NetRequest::DeleteViews { remote_ids } => {
                let error = views.delete(&remote_ids).err().map(|e| e.to_string());
                view_snapshot(&views, error)
            }
        };

        if tx.send(response).is_err() {
            return;
        }
        ctx.request_repaint();
    }
}

/// After a failed mutation the remote may disagree with the optimistic
/// local list; re-sync before answering so the UI rolls back to truth.
fn reconcile_annotations<A: AnnotationStore>(
    annotations: &mut AnnotationService<A>,
    result: orthoview_client::Result<()>,
) -> NetResponse {
    let error = result.err().map(|e| e.to_string());
    if error.is_some() {
        let _ = annotations.fetch_all();
    }
    annotation_snapshot(annotations, error)
}

fn annotation_snapshot<A: AnnotationStore>(
    annotations: &AnnotationService<A>,
    error: Option<String>,
) -> NetResponse {
    NetResponse::Annotations {
        error,
        list: annotations.annotations().to_vec(),
    }
}

fn view_snapshot<V: ViewStore>(views: &SavedViewService<V>, error: Option<String>) -> NetResponse {
    NetResponse::Views {
        error,
        list: views.views().to_vec(),
    }
}
