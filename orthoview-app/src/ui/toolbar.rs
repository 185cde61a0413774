use eframe::egui;

use crate::app::{now_ms, InteractionMode, OrthoViewApp};
use crate::net_worker::NetRequest;

/// Top toolbar: interaction modes, camera actions, session status, and the
/// dismissible persistence-error banner.
pub(crate) fn show(app: &mut OrthoViewApp, ctx: &egui::Context) {
    egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            for mode in [
                InteractionMode::Navigate,
                InteractionMode::Annotate,
                InteractionMode::Measure,
            ] {
                let selected = app.mode == mode;
                if ui.selectable_label(selected, mode.label()).clicked() && !selected {
                    app.set_mode(mode);
                }
            }
            ui.separator();

            if ui.button("Reset views").clicked() {
                app.reset_transforms();
            }
            if ui.button("Save view\u{2026}").clicked() {
                app.show_save_dialog = true;
            }
            if ui.button("Saved views").clicked() {
                app.show_views = !app.show_views;
                if app.show_views {
                    app.request(NetRequest::FetchViews);
                }
            }
            if ui.button("Export slice\u{2026}").clicked() {
                app.export_current_slice();
            }
            ui.separator();

            ui.label(format!(
                "cursor {}/{}/{}",
                app.cursor.x, app.cursor.y, app.cursor.z
            ));
            // The scale calibrates plane pixels, so the physical readout is
            // the cursor's in-plane position on the focused plane.
            let plane = app.focused_plane;
            let (px, py) = app.geometry(plane).project(app.cursor);
            let scale = app.measurements.microns_per_pixel();
            ui.label(format!(
                "{} {:.1}/{:.1} \u{b5}m",
                plane.label(),
                px * scale,
                py * scale,
            ));

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if app.config.api_base_url.is_empty() {
                    ui.label("offline");
                    ui.separator();
                }
                let user = if app.is_authenticated() {
                    app.config.user.as_str()
                } else {
                    "(signed out)"
                };
                ui.label(format!("{user} @ {}", app.config.dataset_id));
            });
        });

        if let Some(message) = app.error_banner.clone() {
            ui.horizontal(|ui| {
                ui.colored_label(egui::Color32::from_rgb(255, 140, 120), message);
                if ui.small_button("dismiss").clicked() {
                    app.error_banner = None;
                }
            });
        }
    });

    save_view_dialog(app, ctx);
}

/// Modal for naming and saving the current camera as a view.
fn save_view_dialog(app: &mut OrthoViewApp, ctx: &egui::Context) {
    if !app.show_save_dialog {
        return;
    }
    let mut open = app.show_save_dialog;
    egui::Window::new("Save view")
        .collapsible(false)
        .resizable(false)
        .open(&mut open)
        .show(ctx, |ui| {
            ui.label("Name");
            let edit = ui.text_edit_singleline(&mut app.save_view_name);

            let name_ok = !app.save_view_name.trim().is_empty();
            if !name_ok {
                ui.colored_label(
                    egui::Color32::from_rgb(255, 140, 120),
                    "Name must not be empty",
                );
            }

            let mut submit = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            ui.horizontal(|ui| {
                if ui.add_enabled(name_ok, egui::Button::new("Save")).clicked() {
                    submit = true;
                }
                if ui.button("Cancel").clicked() {
                    app.show_save_dialog = false;
                    app.save_view_name.clear();
                }
            });

            if submit && name_ok {
                app.request(NetRequest::SaveView {
                    name: app.save_view_name.trim().to_string(),
                    coords: app.cursor,
                    transforms: app.transforms,
                    now_ms: now_ms(),
                });
                app.save_view_name.clear();
                app.show_save_dialog = false;
            }
        });
    app.show_save_dialog &= open;
}
