use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use edx_explorer::data::index::ScanPosition;
use edx_explorer::data::model::ResultField;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – selection widgets
// ---------------------------------------------------------------------------

/// Render the left selection panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Dataset");
    ui.separator();

    if state.folders.is_empty() {
        ui.label(format!(
            "No datasets under {}",
            state.config.kind_dir().display()
        ));
        return;
    }

    // ---- Folder selector ----
    let current = state.folder.clone().unwrap_or_default();
    let mut picked_folder = None;
    egui::ComboBox::from_id_salt("folder")
        .selected_text(&current)
        .show_ui(ui, |ui: &mut Ui| {
            for folder in &state.folders {
                if ui.selectable_label(current == *folder, folder).clicked() {
                    picked_folder = Some(folder.clone());
                }
            }
        });
    if let Some(folder) = picked_folder {
        state.select_folder(Some(folder));
    }
    ui.separator();

    // ---- Position ----
    ui.strong("Position (mm)");
    let grid = state.config.grid;
    let (x_min, x_max) = grid.x_range();
    let (y_min, y_max) = grid.y_range();
    let mut x = state.position.x_mm;
    let mut y = state.position.y_mm;
    let mut moved = false;
    ui.horizontal(|ui: &mut Ui| {
        ui.label("X");
        moved |= ui
            .add(egui::DragValue::new(&mut x).speed(grid.step_x).range(x_min..=x_max))
            .changed();
        ui.label("Y");
        moved |= ui
            .add(egui::DragValue::new(&mut y).speed(grid.step_y).range(y_min..=y_max))
            .changed();
    });
    if moved {
        state.select_position(ScanPosition::new(x, y));
    }
    let index = grid.to_index(state.position);
    ui.label(RichText::new(index.file_name()).weak());
    ui.separator();

    // ---- Element selector ----
    ui.strong("Element");
    if state.elements.is_empty() {
        ui.label("No quantified elements");
    } else {
        let current = state.element.clone().unwrap_or_default();
        let mut picked_element = None;
        egui::ComboBox::from_id_salt("element")
            .selected_text(&current)
            .show_ui(ui, |ui: &mut Ui| {
                for element in &state.elements {
                    if ui.selectable_label(current == *element, element).clicked() {
                        picked_element = Some(element.clone());
                    }
                }
            });
        if let Some(element) = picked_element {
            state.select_element(Some(element));
        }
    }

    if let Some(map) = state.heatmap_colors {
        ui.horizontal_wrapped(|ui: &mut Ui| {
            for (label, [r, g, b]) in map.legend_entries(5) {
                ui.label(RichText::new(format!("■ {label}")).color(Color32::from_rgb(r, g, b)));
            }
        });
    }
    ui.separator();

    quantification_panel(ui, state);
}

/// Quantification results and declared elements of the selected point.
fn quantification_panel(ui: &mut Ui, state: &AppState) {
    let Some(record) = &state.record else {
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            if let (Some(kv), Some(wd)) = (record.primary_energy_kv, record.working_distance_mm) {
                ui.label(format!("{kv} kV, WD {wd} mm"));
            }

            egui::CollapsingHeader::new(RichText::new("Quantification").strong())
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    egui::Grid::new("quantification")
                        .striped(true)
                        .show(ui, |ui: &mut Ui| {
                            for field in ResultField::ALL {
                                ui.strong(field.tag());
                            }
                            ui.end_row();
                            for result in &record.results {
                                for field in ResultField::ALL {
                                    ui.label(result.get(field).unwrap_or("–"));
                                }
                                ui.end_row();
                            }
                        });
                });

            egui::CollapsingHeader::new(RichText::new("Elements").strong())
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    for element in &record.elements {
                        ui.label(format!("{:>3}  {}", element.atomic_number, element.name));
                    }
                });
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open data root…").clicked() {
                open_data_root_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();
        ui.label(format!(
            "{} datasets in {}",
            state.folders.len(),
            state.config.kind_dir().display()
        ));

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Folder dialog
// ---------------------------------------------------------------------------

pub fn open_data_root_dialog(state: &mut AppState) {
    let picked = rfd::FileDialog::new()
        .set_title("Open data root")
        .set_directory(&state.config.data_root)
        .pick_folder();

    if let Some(root) = picked {
        log::info!("Switching data root to {}", root.display());
        state.set_data_root(root);
    }
}
