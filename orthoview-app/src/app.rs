use std::collections::{HashMap, HashSet};
use std::sync::mpsc;

use eframe::egui;
use tracing::{info, warn};

use orthoview_client::SliceStacks;
use orthoview_core::{
    Annotation, Measurements, Plane, PlaneGeometry, PlaneMap, PlaneTransform, RasterDims,
    SavedView, VolumeCursor, VolumeDims, MAX_ZOOM, MIN_ZOOM,
};

use crate::config::{LastView, ViewerConfig};
use crate::net_worker::{self, NetRequest, NetResponse};
use crate::render;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Zoom factor per ctrl/cmd wheel notch, up and down.
pub(crate) const ZOOM_STEP_UP: f64 = 1.05;
pub(crate) const ZOOM_STEP_DOWN: f64 = 0.95;

/// Pick radius in screen pixels for grabbing an annotation marker.
pub(crate) const MARKER_PICK_RADIUS: f32 = 10.0;

/// Maximum number of uploaded slice textures kept alive.
pub(crate) const TEXTURE_CACHE_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// Interaction mode
// ---------------------------------------------------------------------------

/// Exactly one mode is active at a time; dispatch checks measure first,
/// then annotate, else navigate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InteractionMode {
    Navigate,
    Annotate,
    Measure,
}

impl InteractionMode {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Navigate => "Navigate",
            Self::Annotate => "Annotate",
            Self::Measure => "Measure",
        }
    }
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// The slice store is all-or-nothing: the session is loading, ready, or
/// dead with a blocking error.
pub(crate) enum SessionState {
    Loading,
    Ready,
    LoadFailed(String),
}

/// In-place text edit of one annotation.
pub(crate) struct AnnotationEdit {
    pub(crate) local_id: u64,
    pub(crate) buffer: String,
    /// Created by this edit session; dropping the text drops the record.
    pub(crate) is_new: bool,
    pub(crate) focus_requested: bool,
}

// ---------------------------------------------------------------------------
// Application struct
// ---------------------------------------------------------------------------

pub(crate) struct OrthoViewApp {
    pub(crate) config: ViewerConfig,
    pub(crate) volume: VolumeDims,
    pub(crate) state: SessionState,

    // Camera
    pub(crate) cursor: VolumeCursor,
    pub(crate) transforms: PlaneMap<PlaneTransform>,

    // Slice data
    pub(crate) stacks: Option<SliceStacks>,
    pub(crate) rasters: PlaneMap<RasterDims>,
    pub(crate) textures: PlaneMap<HashMap<u32, egui::TextureHandle>>,

    // Interaction
    pub(crate) mode: InteractionMode,
    pub(crate) measurements: Measurements,
    pub(crate) hovered_plane: Option<Plane>,
    pub(crate) focused_plane: Plane,
    pub(crate) drag_annotation: Option<u64>,

    // Annotations (display copy; the worker owns the service)
    pub(crate) annotations: Vec<Annotation>,
    pub(crate) annotation_seq: u64,
    pub(crate) editing: Option<AnnotationEdit>,

    // Saved views
    pub(crate) views: Vec<SavedView>,
    pub(crate) show_views: bool,
    pub(crate) view_selection: HashSet<String>,
    pub(crate) renaming_view: Option<(String, String)>,
    pub(crate) show_save_dialog: bool,
    pub(crate) save_view_name: String,

    // Dismissible persistence-error banner
    pub(crate) error_banner: Option<String>,

    // Network worker
    pub(crate) tx_request: mpsc::Sender<NetRequest>,
    pub(crate) rx_response: mpsc::Receiver<NetResponse>,
}

impl OrthoViewApp {
    pub(crate) fn new(egui_ctx: &egui::Context, config: ViewerConfig) -> Self {
        let volume = config.volume_dims();

        let measurements = Measurements::new(config.microns_per_pixel).unwrap_or_else(|e| {
            warn!("Bad microns-per-pixel in config ({e}), falling back to 1.0");
            Measurements::new(1.0).expect("unit scale is valid")
        });

        // Restore the previous session's camera when enabled.
        let (cursor, transforms) = match (config.restore_last_view, &config.last_view) {
            (true, Some(last)) => {
                let mut transforms = last.transforms;
                for plane in Plane::ALL {
                    let t = &mut transforms[plane];
                    t.zoom = t.zoom.clamp(MIN_ZOOM, MAX_ZOOM);
                }
                info!("Restoring last session camera");
                (last.cursor.clamped(volume), transforms)
            }
            _ => (VolumeCursor::centered(volume), PlaneMap::default()),
        };

        let (tx_request, rx_response) = net_worker::spawn(&config, egui_ctx.clone());

        let app = Self {
            config,
            volume,
            state: SessionState::Loading,

            cursor,
            transforms,

            stacks: None,
            rasters: PlaneMap::from_fn(|_| RasterDims { width: 1, height: 1 }),
            textures: PlaneMap::default(),

            mode: InteractionMode::Navigate,
            measurements,
            hovered_plane: None,
            focused_plane: Plane::Xy,
            drag_annotation: None,

            annotations: Vec::new(),
            annotation_seq: 1,
            editing: None,

            views: Vec::new(),
            show_views: false,
            view_selection: HashSet::new(),
            renaming_view: None,
            show_save_dialog: false,
            save_view_name: String::new(),

            error_banner: None,

            tx_request,
            rx_response,
        };

        app.request(NetRequest::LoadSlices);
        app.request(NetRequest::FetchAnnotations);
        app.request(NetRequest::FetchViews);
        app
    }

    pub(crate) fn request(&self, request: NetRequest) {
        let _ = self.tx_request.send(request);
    }

    pub(crate) fn geometry(&self, plane: Plane) -> PlaneGeometry {
        PlaneGeometry::new(plane, self.rasters[plane], self.volume)
    }

    pub(crate) fn is_authenticated(&self) -> bool {
        !self.config.user.is_empty()
    }

    /// Switch interaction mode; leaving measure mode wipes all transient
    /// measurement state.
    pub(crate) fn set_mode(&mut self, mode: InteractionMode) {
        if self.mode == InteractionMode::Measure && mode != InteractionMode::Measure {
            self.measurements.clear();
        }
        self.mode = mode;
    }

    pub(crate) fn reset_transforms(&mut self) {
        for plane in Plane::ALL {
            self.transforms[plane].reset();
        }
    }

    pub(crate) fn alloc_annotation_id(&mut self) -> u64 {
        let id = self.annotation_seq;
        self.annotation_seq += 1;
        id
    }

    // -- Worker responses ----------------------------------------------------

    pub(crate) fn poll_responses(&mut self, _ctx: &egui::Context) {
        while let Ok(response) = self.rx_response.try_recv() {
            match response {
                NetResponse::Slices(Ok(stacks)) => {
                    self.rasters = stacks.rasters;
                    self.stacks = Some(stacks);
                    self.textures = PlaneMap::default();
                    self.state = SessionState::Ready;
                    info!("session ready");
                }
                NetResponse::Slices(Err(e)) => {
                    self.state = SessionState::LoadFailed(error_chain(&e));
                }
                NetResponse::Annotations { error, list } => {
                    self.apply_annotation_list(list);
                    if let Some(msg) = error {
                        self.error_banner = Some(msg);
                    }
                }
                NetResponse::Views { error, list } => {
                    self.views = list;
                    let views = &self.views;
                    self.view_selection
                        .retain(|id| views.iter().any(|v| v.remote_id.as_deref() == Some(id.as_str())));
                    if let Some(msg) = error {
                        self.error_banner = Some(msg);
                    }
                }
                NetResponse::ViewLoaded(Ok(view)) => self.apply_saved_view(view),
                NetResponse::ViewLoaded(Err(msg)) => self.error_banner = Some(msg),
            }
        }
    }

    /// Replace the display list with the worker's authoritative copy,
    /// carrying over any still-pending local records it cannot know about.
    fn apply_annotation_list(&mut self, list: Vec<Annotation>) {
        let pending: Vec<Annotation> = self
            .annotations
            .iter()
            .filter(|a| a.remote_id.is_none() && !list.iter().any(|n| n.id == a.id))
            .cloned()
            .collect();
        self.annotations = list;
        self.annotations.extend(pending);

        let max = self.annotations.iter().map(|a| a.id).max().unwrap_or(0);
        self.annotation_seq = self.annotation_seq.max(max + 1);
    }

    /// Restore a saved view into the live camera.
    pub(crate) fn apply_saved_view(&mut self, view: SavedView) {
        self.cursor = view.coords.clamped(self.volume);
        self.transforms = view.transforms();
        for plane in Plane::ALL {
            let t = &mut self.transforms[plane];
            t.zoom = t.zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
        if let Some(slot) = self
            .views
            .iter_mut()
            .find(|v| v.remote_id == view.remote_id)
        {
            *slot = view.clone();
        }
        info!(name = %view.name, "restored saved view");
    }

    // -- Annotation editing --------------------------------------------------

    pub(crate) fn begin_annotation_edit(&mut self, local_id: u64, is_new: bool) {
        let buffer = self
            .annotations
            .iter()
            .find(|a| a.id == local_id)
            .map(|a| a.text.clone())
            .unwrap_or_default();
        self.editing = Some(AnnotationEdit {
            local_id,
            buffer,
            is_new,
            focus_requested: true,
        });
    }

    /// Commit the in-progress text edit: empty text deletes (with no create
    /// call for a never-persisted record), anything else saves.
    pub(crate) fn commit_annotation_edit(&mut self) {
        let Some(edit) = self.editing.take() else {
            return;
        };
        let Some(pos) = self.annotations.iter().position(|a| a.id == edit.local_id) else {
            return;
        };
        let trimmed = edit.buffer.trim();

        if trimmed.is_empty() {
            if self.annotations[pos].remote_id.is_none() {
                self.annotations.remove(pos);
                return;
            }
            let mut doomed = self.annotations[pos].clone();
            doomed.text.clear();
            self.request(NetRequest::SaveAnnotation {
                annotation: doomed,
                position_only: false,
            });
            return;
        }

        let mut updated = self.annotations[pos].clone();
        updated.text = trimmed.to_string();
        self.annotations[pos] = updated.clone();
        self.request(NetRequest::SaveAnnotation {
            annotation: updated,
            position_only: false,
        });
    }

    /// Abandon the edit; a record created by this edit session goes away.
    pub(crate) fn cancel_annotation_edit(&mut self) {
        if let Some(edit) = self.editing.take() {
            if edit.is_new {
                self.annotations.retain(|a| a.id != edit.local_id);
            }
        }
    }

    /// Delete by session id: a pending record is dropped locally, a
    /// persisted one goes to the store and leaves the list on the ack.
    pub(crate) fn delete_annotation(&mut self, local_id: u64) {
        if self.editing.as_ref().map(|e| e.local_id) == Some(local_id) {
            self.editing = None;
        }
        let Some(annotation) = self.annotations.iter().find(|a| a.id == local_id) else {
            return;
        };
        if annotation.remote_id.is_none() {
            self.annotations.retain(|a| a.id != local_id);
        } else {
            self.request(NetRequest::DeleteAnnotation { local_id });
        }
    }

    /// Jump the cursor to an annotation's anchor.
    pub(crate) fn navigate_to_annotation(&mut self, local_id: u64) {
        let Some(annotation) = self.annotations.iter().find(|a| a.id == local_id).cloned() else {
            return;
        };
        self.cursor
            .set_component(annotation.plane.fixed_axis(), annotation.slice, self.volume);
        self.geometry(annotation.plane)
            .apply_click(&mut self.cursor, annotation.x, annotation.y);
    }

    // -- Last-view snapshot ----------------------------------------------------

    pub(crate) fn capture_last_view(&self) -> LastView {
        LastView {
            cursor: self.cursor,
            transforms: self.transforms,
        }
    }
}

/// Flatten an error and its source chain into one message.
pub(crate) fn error_chain(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(s) = source {
        msg.push_str(": ");
        msg.push_str(&s.to_string());
        source = s.source();
    }
    msg
}

/// Milliseconds since the epoch.
pub(crate) fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

// ---------------------------------------------------------------------------
// eframe::App
// ---------------------------------------------------------------------------

impl eframe::App for OrthoViewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_responses(ctx);

        match &self.state {
            SessionState::Loading => {
                loading_screen(ctx);
                return;
            }
            SessionState::LoadFailed(message) => {
                let message = message.clone();
                if failure_screen(ctx, &message) {
                    self.state = SessionState::Loading;
                    self.request(NetRequest::LoadSlices);
                }
                return;
            }
            SessionState::Ready => {}
        }

        self.handle_keyboard(ctx);

        crate::ui::toolbar::show(self, ctx);
        crate::ui::annotations::show(self, ctx);
        crate::ui::views::show(self, ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.columns(3, |columns| {
                for (i, plane) in Plane::ALL.iter().copied().enumerate() {
                    self.plane_panel(&mut columns[i], plane);
                }
            });
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.config.last_view = Some(self.capture_last_view());
        self.config.save();
        info!("Saved configuration on exit");
    }
}

impl OrthoViewApp {
    fn plane_panel(&mut self, ui: &mut egui::Ui, plane: Plane) {
        let slice_count = self.volume.slice_count(plane);
        let mut slice = self.cursor.slice_index(plane);

        ui.horizontal(|ui| {
            ui.colored_label(render::plane_color(plane), plane.label());
            ui.label(format!("slice {slice:03}/{:03}", slice_count - 1));
            ui.label(format!("{:.0}%", self.transforms[plane].zoom * 100.0));
            if ui.small_button("reset view").clicked() {
                self.transforms[plane].reset();
            }
        });

        // The slider drives the plane's fixed axis directly.
        if ui
            .add(egui::Slider::new(&mut slice, 0..=slice_count - 1).show_value(false))
            .changed()
        {
            self.cursor.set_component(plane.fixed_axis(), slice, self.volume);
        }

        let ctx = ui.ctx().clone();
        let response = self.draw_plane(ui, plane);
        self.handle_plane_input(&ctx, plane, &response);
    }
}

fn loading_screen(ctx: &egui::Context) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() * 0.4);
            ui.spinner();
            ui.label("Loading slice stacks\u{2026}");
        });
    });
}

/// Blocking load-failure screen. Returns true when the user asks to retry.
fn failure_screen(ctx: &egui::Context, message: &str) -> bool {
    let mut retry = false;
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() * 0.4);
            ui.colored_label(egui::Color32::from_rgb(255, 120, 120), "Failed to load dataset");
            ui.label(message);
            if ui.button("Retry").clicked() {
                retry = true;
            }
        });
    });
    retry
}
