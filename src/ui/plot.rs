use eframe::egui::{Color32, Stroke, Ui};
use egui_plot::{Line, Plot, PlotPoints, Polygon};

use edx_explorer::data::index::ScanPosition;
use edx_explorer::figure::Trace;

use crate::state::AppState;

/// Fallback when a trace names a colour we do not know.
const DEFAULT_LINE_COLOR: Color32 = Color32::LIGHT_BLUE;

// ---------------------------------------------------------------------------
// Spectrum plot
// ---------------------------------------------------------------------------

/// Render the spectrum of the selected scan point.
pub fn spectrum_plot(ui: &mut Ui, state: &AppState) {
    if state.spectrum.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Select a dataset to view spectra");
        });
        return;
    }

    let title = state.spectrum.title().unwrap_or_default().to_string();
    ui.label(title);

    Plot::new("spectrum_plot")
        .x_axis_label("Energy (eV)")
        .y_axis_label("Counts")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for trace in &state.spectrum.data {
                let Trace::Scatter { x, y, marker_color } = trace else {
                    continue;
                };
                let points: PlotPoints = x.iter().zip(y).map(|(&xi, &yi)| [xi, yi]).collect();
                let color = marker_color
                    .as_deref()
                    .map(named_color)
                    .unwrap_or(DEFAULT_LINE_COLOR);
                plot_ui.line(Line::new(points).color(color).width(1.2));
            }
        });
}

fn named_color(name: &str) -> Color32 {
    match name {
        "purple" => Color32::from_rgb(128, 0, 128),
        "red" => Color32::RED,
        "black" => Color32::BLACK,
        _ => DEFAULT_LINE_COLOR,
    }
}

// ---------------------------------------------------------------------------
// Heatmap
// ---------------------------------------------------------------------------

/// Render the element heatmap. Returns the position clicked, if any.
pub fn heatmap_plot(ui: &mut Ui, state: &AppState) -> Option<ScanPosition> {
    if state.heatmap.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("No quantified element selected");
        });
        return None;
    }

    if let Some(title) = state.heatmap.title() {
        ui.label(title);
    }

    let grid = state.config.grid;
    let (half_w, half_h) = (grid.step_x / 2.0, grid.step_y / 2.0);
    let selected = state.position;

    let response = Plot::new("heatmap_plot")
        .data_aspect(1.0)
        .x_axis_label("X (mm)")
        .y_axis_label("Y (mm)")
        .allow_drag(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for trace in &state.heatmap.data {
                let Trace::Heatmap { x, y, z, .. } = trace else {
                    continue;
                };
                for ((&cx, &cy), &value) in x.iter().zip(y).zip(z) {
                    let fill = state
                        .heatmap_colors
                        .map(|map| {
                            let [r, g, b] = map.color_for(value);
                            Color32::from_rgb(r, g, b)
                        })
                        .unwrap_or(Color32::GRAY);
                    let is_selected = cx == selected.x_mm && cy == selected.y_mm;
                    let stroke = if is_selected {
                        Stroke::new(2.0, Color32::WHITE)
                    } else {
                        Stroke::NONE
                    };
                    let cell = vec![
                        [cx - half_w, cy - half_h],
                        [cx + half_w, cy - half_h],
                        [cx + half_w, cy + half_h],
                        [cx - half_w, cy + half_h],
                    ];
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::from(cell))
                            .fill_color(fill)
                            .stroke(stroke),
                    );
                }
            }

            if plot_ui.response().clicked() {
                plot_ui
                    .pointer_coordinate()
                    .map(|p| ScanPosition::new(p.x, p.y))
            } else {
                None
            }
        });

    response.inner
}
