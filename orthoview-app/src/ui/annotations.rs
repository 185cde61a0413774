use eframe::egui;

use crate::app::OrthoViewApp;

/// Right-hand annotation list.
///
/// Click navigates the cursor to the anchor, double-click edits the text in
/// place (Enter or focus loss commits, cleared text deletes), the cross
/// deletes outright.
pub(crate) fn show(app: &mut OrthoViewApp, ctx: &egui::Context) {
    egui::SidePanel::right("annotations")
        .default_width(260.0)
        .show(ctx, |ui| {
            ui.heading("Annotations");
            if !app.is_authenticated() {
                ui.label("Sign in to create annotations.");
            } else if app.annotations.is_empty() {
                ui.label("Annotate mode: click a plane to place one.");
            }
            ui.separator();

            let mut navigate: Option<u64> = None;
            let mut edit: Option<u64> = None;
            let mut delete: Option<u64> = None;
            let mut commit = false;

            egui::ScrollArea::vertical().show(ui, |ui| {
                let editing_id = app.editing.as_ref().map(|e| e.local_id);
                let rows: Vec<(u64, String)> = app
                    .annotations
                    .iter()
                    .map(|a| {
                        let text = if a.text.is_empty() { "(empty)" } else { &a.text };
                        (a.id, format!("{} {:03}  {text}", a.plane.label(), a.slice))
                    })
                    .collect();

                for (id, label) in rows {
                    if editing_id == Some(id) {
                        let edit_state = app.editing.as_mut().unwrap();
                        let response = ui.text_edit_singleline(&mut edit_state.buffer);
                        if edit_state.focus_requested {
                            response.request_focus();
                            edit_state.focus_requested = false;
                        }
                        // Enter also drops focus, so one check covers both.
                        if response.lost_focus() {
                            commit = true;
                        }
                        continue;
                    }
                    ui.horizontal(|ui| {
                        let response = ui.selectable_label(false, &label);
                        if response.double_clicked() {
                            edit = Some(id);
                        } else if response.clicked() {
                            navigate = Some(id);
                        }
                        if ui.small_button("\u{2715}").clicked() {
                            delete = Some(id);
                        }
                    });
                }
            });

            if commit {
                app.commit_annotation_edit();
            }
            if let Some(id) = edit {
                app.begin_annotation_edit(id, false);
            }
            if let Some(id) = navigate {
                app.navigate_to_annotation(id);
            }
            if let Some(id) = delete {
                app.delete_annotation(id);
            }
        });
}
