use eframe::egui;

use crate::app::OrthoViewApp;
use crate::net_worker::NetRequest;

struct Row {
    id: String,
    name: String,
    creator: String,
    load_count: u32,
    own_count: u32,
}

/// Saved-view browser: load, rename (double-click the name), and single or
/// bulk delete via the checkboxes.
pub(crate) fn show(app: &mut OrthoViewApp, ctx: &egui::Context) {
    if !app.show_views {
        return;
    }
    let mut open = app.show_views;
    egui::Window::new("Saved views")
        .default_width(460.0)
        .open(&mut open)
        .show(ctx, |ui| {
            if ui.button("Refresh").clicked() {
                app.request(NetRequest::FetchViews);
            }
            ui.separator();

            let mut load: Option<String> = None;
            let mut start_rename: Option<(String, String)> = None;
            let mut rename_commit: Option<(String, String)> = None;

            let user = app.config.user.clone();
            let rows: Vec<Row> = app
                .views
                .iter()
                .filter_map(|v| {
                    v.remote_id.clone().map(|id| Row {
                        id,
                        name: v.name.clone(),
                        creator: v.creator.clone(),
                        load_count: v.load_count,
                        own_count: v.user_count(&user),
                    })
                })
                .collect();

            if rows.is_empty() {
                ui.label("No saved views yet.");
            }

            egui::ScrollArea::vertical().show(ui, |ui| {
                for row in rows {
                    ui.horizontal(|ui| {
                        let mut selected = app.view_selection.contains(&row.id);
                        if ui.checkbox(&mut selected, "").changed() {
                            if selected {
                                app.view_selection.insert(row.id.clone());
                            } else {
                                app.view_selection.remove(&row.id);
                            }
                        }

                        let renaming_this = app
                            .renaming_view
                            .as_ref()
                            .is_some_and(|(id, _)| id == &row.id);
                        if renaming_this {
                            let (_, buffer) = app.renaming_view.as_mut().unwrap();
                            let response = ui.text_edit_singleline(buffer);
                            if response.lost_focus() {
                                let (id, buffer) = app.renaming_view.take().unwrap();
                                rename_commit = Some((id, buffer));
                            }
                        } else {
                            let response = ui.selectable_label(false, &row.name);
                            if response.double_clicked() {
                                start_rename = Some((row.id.clone(), row.name.clone()));
                            }
                        }

                        ui.label(format!("by {}", row.creator));
                        ui.label(format!("loads {} (you {})", row.load_count, row.own_count));
                        if ui.button("Load").clicked() {
                            load = Some(row.id.clone());
                        }
                    });
                }
            });

            ui.separator();
            let selected: Vec<String> = app.view_selection.iter().cloned().collect();
            let delete_label = if selected.len() > 1 {
                format!("Delete {} views", selected.len())
            } else {
                "Delete selected".to_string()
            };
            if ui
                .add_enabled(!selected.is_empty(), egui::Button::new(delete_label))
                .clicked()
            {
                app.request(NetRequest::DeleteViews {
                    remote_ids: selected,
                });
                app.view_selection.clear();
            }

            if let Some((id, name)) = start_rename {
                app.renaming_view = Some((id, name));
            }
            if let Some((id, name)) = rename_commit {
                if name.trim().is_empty() {
                    app.error_banner = Some("View name must not be empty".into());
                } else {
                    app.request(NetRequest::RenameView {
                        remote_id: id,
                        name,
                    });
                }
            }
            if let Some(id) = load {
                app.request(NetRequest::LoadView { remote_id: id });
            }
        });
    app.show_views = open;
}
