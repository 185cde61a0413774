use eframe::egui;
use tracing::debug;

use orthoview_core::{Annotation, Axis, MeasurePoint, Plane};

use crate::app::{
    InteractionMode, OrthoViewApp, MARKER_PICK_RADIUS, ZOOM_STEP_DOWN, ZOOM_STEP_UP,
};
use crate::net_worker::NetRequest;

impl OrthoViewApp {
    /// Route pointer and wheel events on one plane panel.
    pub(crate) fn handle_plane_input(
        &mut self,
        ctx: &egui::Context,
        plane: Plane,
        response: &egui::Response,
    ) {
        let origin = response.rect.min;

        if response.hovered() {
            self.hovered_plane = Some(plane);
        }
        if response.clicked() || response.dragged() {
            self.focused_plane = plane;
        }

        // Wheel: plain scroll steps the z cursor whichever plane is under
        // the pointer; with ctrl/cmd it zooms that plane instead.
        let scroll_y = ctx.input(|i| i.raw_scroll_delta.y);
        if scroll_y.abs() > 0.0 && response.hovered() {
            if ctx.input(|i| i.modifiers.command) {
                let factor = if scroll_y > 0.0 {
                    ZOOM_STEP_UP
                } else {
                    ZOOM_STEP_DOWN
                };
                self.transforms[plane].zoom_by(factor);
            } else {
                let delta = if scroll_y > 0.0 { 1 } else { -1 };
                self.cursor.step(Axis::Z, delta, self.volume);
            }
        }

        // Right-button drag pans by the raw pointer delta, independent of
        // zoom: pan lives in screen space.
        if response.dragged_by(egui::PointerButton::Secondary) {
            let delta = response.drag_delta();
            self.transforms[plane].pan_by(delta.x as f64, delta.y as f64);
        }

        // In annotate mode a primary drag near a marker moves it.
        if self.mode == InteractionMode::Annotate {
            self.handle_marker_drag(plane, response);
        }

        // Primary click: measure takes priority, then annotate, else
        // navigate.
        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                let sx = (pos.x - origin.x) as f64;
                let sy = (pos.y - origin.y) as f64;
                match self.mode {
                    InteractionMode::Measure => self.measure_click(plane, sx, sy),
                    InteractionMode::Annotate => self.annotate_click(plane, sx, sy),
                    InteractionMode::Navigate => self.navigate_click(plane, sx, sy),
                }
            }
        }
    }

    /// Navigate: update the two axes this plane exposes, leave the third.
    fn navigate_click(&mut self, plane: Plane, sx: f64, sy: f64) {
        let raster = self.rasters[plane];
        let (px, py) = self.transforms[plane].to_pixel_clamped(sx, sy, raster.width, raster.height);
        self.geometry(plane).apply_click(&mut self.cursor, px, py);
    }

    /// Measure: accumulate unclamped plane-pixel points; every second
    /// click closes a line.
    fn measure_click(&mut self, plane: Plane, sx: f64, sy: f64) {
        let (px, py) = self.transforms[plane].to_pixel(sx, sy);
        if let Some(line) = self.measurements.add_point(plane, MeasurePoint { x: px, y: py }) {
            debug!(%plane, dist = line.dist, "measurement line closed");
        }
    }

    /// Annotate: place a pending record at the clamped plane-pixel position
    /// on the current slice and open it for editing.
    fn annotate_click(&mut self, plane: Plane, sx: f64, sy: f64) {
        if !self.is_authenticated() {
            self.error_banner = Some("Annotations require a signed-in user".into());
            return;
        }
        if self.editing.is_some() {
            // A single edit at a time; finish the previous one first.
            self.commit_annotation_edit();
        }

        let raster = self.rasters[plane];
        let (px, py) = self.transforms[plane].to_pixel_clamped(sx, sy, raster.width, raster.height);
        let id = self.alloc_annotation_id();
        let annotation = Annotation::pending(
            id,
            plane,
            self.cursor.slice_index(plane),
            px,
            py,
            self.config.user.clone(),
            self.config.dataset_id.clone(),
            crate::app::now_ms(),
        );
        self.annotations.push(annotation);
        self.begin_annotation_edit(id, true);
    }

    /// Drag-to-move for existing markers. The position-only save fires on
    /// release, and only for records that already have a remote identity.
    fn handle_marker_drag(&mut self, plane: Plane, response: &egui::Response) {
        let origin = response.rect.min;

        if response.drag_started_by(egui::PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                self.drag_annotation = self.pick_marker(plane, pos - origin.to_vec2());
            }
        }

        let Some(local_id) = self.drag_annotation else {
            return;
        };

        if response.dragged_by(egui::PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                let raster = self.rasters[plane];
                let (px, py) = self.transforms[plane].to_pixel_clamped(
                    (pos.x - origin.x) as f64,
                    (pos.y - origin.y) as f64,
                    raster.width,
                    raster.height,
                );
                if let Some(a) = self.annotations.iter_mut().find(|a| a.id == local_id) {
                    a.x = px;
                    a.y = py;
                }
            }
        }

        if response.drag_stopped_by(egui::PointerButton::Primary) {
            self.drag_annotation = None;
            if let Some(a) = self.annotations.iter().find(|a| a.id == local_id) {
                if a.is_persisted() {
                    self.request(NetRequest::SaveAnnotation {
                        annotation: a.clone(),
                        position_only: true,
                    });
                }
            }
        }
    }

    /// Nearest marker of the current plane+slice within the pick radius,
    /// measured in screen space.
    fn pick_marker(&self, plane: Plane, local: egui::Pos2) -> Option<u64> {
        let slice = self.cursor.slice_index(plane);
        let t = self.transforms[plane];
        let mut best: Option<(u64, f32)> = None;
        for a in &self.annotations {
            if a.plane != plane || a.slice != slice {
                continue;
            }
            let (sx, sy) = t.to_screen(a.x, a.y);
            let d = ((sx as f32 - local.x).powi(2) + (sy as f32 - local.y).powi(2)).sqrt();
            if d <= MARKER_PICK_RADIUS && best.map_or(true, |(_, bd)| d < bd) {
                best = Some((a.id, d));
            }
        }
        best.map(|(id, _)| id)
    }

    pub(crate) fn handle_keyboard(&mut self, ctx: &egui::Context) {
        let text_editing = ctx.memory(|m| m.focused().is_some());

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            if self.editing.is_some() {
                self.cancel_annotation_edit();
            } else if self.show_save_dialog {
                self.show_save_dialog = false;
            } else if self.show_views {
                self.show_views = false;
            } else if self.mode != InteractionMode::Navigate {
                self.set_mode(InteractionMode::Navigate);
            }
        }

        if text_editing {
            return; // The focused text field owns the keyboard.
        }

        ctx.input(|input| {
            // Arrows step the hovered plane's two exposed axes.
            if let Some(plane) = self.hovered_plane {
                let (h, v) = plane.axes();
                if input.key_pressed(egui::Key::ArrowLeft) {
                    self.cursor.step(h, -1, self.volume);
                }
                if input.key_pressed(egui::Key::ArrowRight) {
                    self.cursor.step(h, 1, self.volume);
                }
                if input.key_pressed(egui::Key::ArrowUp) {
                    self.cursor.step(v, -1, self.volume);
                }
                if input.key_pressed(egui::Key::ArrowDown) {
                    self.cursor.step(v, 1, self.volume);
                }
            }
            if input.key_pressed(egui::Key::PageUp) {
                self.cursor.step(Axis::Z, 1, self.volume);
            }
            if input.key_pressed(egui::Key::PageDown) {
                self.cursor.step(Axis::Z, -1, self.volume);
            }
        });

        if ctx.input(|i| i.key_pressed(egui::Key::N)) {
            self.set_mode(InteractionMode::Navigate);
        }
        if ctx.input(|i| i.key_pressed(egui::Key::A)) {
            self.set_mode(InteractionMode::Annotate);
        }
        if ctx.input(|i| i.key_pressed(egui::Key::M)) {
            let next = if self.mode == InteractionMode::Measure {
                InteractionMode::Navigate
            } else {
                InteractionMode::Measure
            };
            self.set_mode(next);
        }
        if ctx.input(|i| i.key_pressed(egui::Key::R)) {
            self.reset_transforms();
        }
        if ctx.input(|i| i.key_pressed(egui::Key::S)) {
            self.show_save_dialog = true;
        }
        if ctx.input(|i| i.key_pressed(egui::Key::V)) {
            self.show_views = !self.show_views;
            if self.show_views {
                self.request(NetRequest::FetchViews);
            }
        }
    }
}
