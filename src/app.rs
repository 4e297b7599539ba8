use eframe::egui;

use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct EdxExplorerApp {
    pub state: AppState,
}

impl EdxExplorerApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for EdxExplorerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: dataset, position, element ----
        egui::SidePanel::left("selection_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Right side panel: heatmap ----
        let clicked = egui::SidePanel::right("heatmap_panel")
            .default_width(420.0)
            .resizable(true)
            .show(ctx, |ui| plot::heatmap_plot(ui, &self.state))
            .inner;
        if let Some(position) = clicked {
            self.state.select_position(position);
        }

        // ---- Central panel: spectrum ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::spectrum_plot(ui, &self.state);
        });
    }
}
