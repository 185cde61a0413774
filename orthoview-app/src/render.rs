use eframe::egui;

use orthoview_core::{Plane, PlaneMap, PlaneTransform};

use crate::app::{OrthoViewApp, TEXTURE_CACHE_CAPACITY};

/// Background behind the slice images.
const BACKGROUND: egui::Color32 = egui::Color32::from_gray(12);
/// Measurement overlay color.
const MEASURE_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 210, 60);
/// Persisted annotation marker color.
const MARKER_COLOR: egui::Color32 = egui::Color32::from_rgb(120, 200, 255);
/// Pending (unsaved) annotation marker color.
const PENDING_MARKER_COLOR: egui::Color32 = egui::Color32::from_gray(200);

/// Fixed crosshair color per plane: XY red, XZ green, YZ blue.
pub(crate) fn plane_color(plane: Plane) -> egui::Color32 {
    match plane {
        Plane::Xy => egui::Color32::from_rgb(230, 70, 70),
        Plane::Xz => egui::Color32::from_rgb(80, 200, 100),
        Plane::Yz => egui::Color32::from_rgb(90, 140, 255),
    }
}

/// Plane-pixel position to absolute screen position under a transform.
fn to_screen(rect: egui::Rect, t: PlaneTransform, px: f64, py: f64) -> egui::Pos2 {
    let (sx, sy) = t.to_screen(px, py);
    egui::pos2(rect.min.x + sx as f32, rect.min.y + sy as f32)
}

impl OrthoViewApp {
    /// Draw one plane panel: background, slice image under pan/zoom,
    /// measurement overlays, annotation markers, then the crosshair.
    ///
    /// Repainted from scratch every frame, so repeated draws never
    /// accumulate state.
    pub(crate) fn draw_plane(&mut self, ui: &mut egui::Ui, plane: Plane) -> egui::Response {
        let size = ui.available_size();
        let (response, painter) = ui.allocate_painter(size, egui::Sense::click_and_drag());
        let rect = response.rect;

        painter.rect_filled(rect, 0.0, BACKGROUND);

        let transform = self.transforms[plane];

        if let Some(texture_id) = self.slice_texture(ui.ctx(), plane).map(|t| t.id()) {
            let raster = self.rasters[plane];
            let min = rect.min + egui::vec2(transform.pan.x as f32, transform.pan.y as f32);
            let image_size = egui::vec2(
                (raster.width as f64 * transform.zoom) as f32,
                (raster.height as f64 * transform.zoom) as f32,
            );
            let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
            painter.image(
                texture_id,
                egui::Rect::from_min_size(min, image_size),
                uv,
                egui::Color32::WHITE,
            );
        }

        self.draw_measurements(&painter, rect, plane, transform);
        self.draw_markers(&painter, rect, plane, transform);

        // The crosshair maps the cursor's volume coordinates against canvas
        // pixels, not through pan/zoom: it marks the clicked screen
        // location and stays put as the image is zoomed underneath it.
        let (h, v) = plane.axes();
        let fx = rect.min.x
            + ((self.cursor.component(h) as f32 + 0.5) / self.volume.axis_len(h) as f32)
                * rect.width();
        let fy = rect.min.y
            + ((self.cursor.component(v) as f32 + 0.5) / self.volume.axis_len(v) as f32)
                * rect.height();
        let stroke = egui::Stroke::new(1.0, plane_color(plane));
        painter.line_segment([egui::pos2(rect.min.x, fy), egui::pos2(rect.max.x, fy)], stroke);
        painter.line_segment([egui::pos2(fx, rect.min.y), egui::pos2(fx, rect.max.y)], stroke);

        response
    }

    fn draw_measurements(
        &self,
        painter: &egui::Painter,
        rect: egui::Rect,
        plane: Plane,
        t: PlaneTransform,
    ) {
        let stroke = egui::Stroke::new(1.5, MEASURE_COLOR);
        for line in self.measurements.lines(plane) {
            let a = to_screen(rect, t, line.p1.x, line.p1.y);
            let b = to_screen(rect, t, line.p2.x, line.p2.y);
            painter.line_segment([a, b], stroke);
            painter.circle_filled(a, 2.5, MEASURE_COLOR);
            painter.circle_filled(b, 2.5, MEASURE_COLOR);

            let mid = egui::pos2((a.x + b.x) * 0.5, (a.y + b.y) * 0.5);
            painter.text(
                mid + egui::vec2(6.0, -4.0),
                egui::Align2::LEFT_BOTTOM,
                format!("{:.1} \u{b5}m", line.dist),
                egui::FontId::proportional(12.0),
                MEASURE_COLOR,
            );
        }
        // Dangling first endpoint of an in-progress pair.
        if let Some(p) = self.measurements.pending(plane) {
            painter.circle_stroke(to_screen(rect, t, p.x, p.y), 4.0, stroke);
        }
    }

    fn draw_markers(
        &self,
        painter: &egui::Painter,
        rect: egui::Rect,
        plane: Plane,
        t: PlaneTransform,
    ) {
        let slice = self.cursor.slice_index(plane);
        for annotation in &self.annotations {
            if annotation.plane != plane || annotation.slice != slice {
                continue;
            }
            let pos = to_screen(rect, t, annotation.x, annotation.y);
            let color = if annotation.is_persisted() {
                MARKER_COLOR
            } else {
                PENDING_MARKER_COLOR
            };
            painter.circle_filled(pos, 3.0, color);
            if !annotation.text.is_empty() {
                painter.text(
                    pos + egui::vec2(6.0, 0.0),
                    egui::Align2::LEFT_CENTER,
                    &annotation.text,
                    egui::FontId::proportional(12.0),
                    color,
                );
            }
        }
    }

    /// Current slice texture for a plane, uploaded on first use and cached.
    fn slice_texture(&mut self, ctx: &egui::Context, plane: Plane) -> Option<&egui::TextureHandle> {
        let index = self.cursor.slice_index(plane);
        if !self.textures[plane].contains_key(&index) {
            let cached: usize = Plane::ALL.iter().map(|&p| self.textures[p].len()).sum();
            if cached >= TEXTURE_CACHE_CAPACITY {
                self.textures = PlaneMap::default();
            }
            let stacks = self.stacks.as_ref()?;
            let slice = stacks.slice(plane, index)?;
            let image = egui::ColorImage::from_rgba_unmultiplied(
                [slice.width as usize, slice.height as usize],
                &slice.pixels,
            );
            let handle = ctx.load_texture(
                format!("slice_{}_{index:03}", plane.wire_name()),
                image,
                egui::TextureOptions::NEAREST,
            );
            self.textures[plane].insert(index, handle);
        }
        self.textures[plane].get(&index)
    }
}
