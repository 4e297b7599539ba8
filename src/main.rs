mod app;
mod state;
mod ui;

use std::path::PathBuf;

use app::EdxExplorerApp;
use eframe::egui;
use edx_explorer::config::load_config;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    // Optional first argument: path to a JSON config file.
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let handle = load_config(config_path.as_deref());
    if let Some(source) = &handle.source {
        log::info!("Using configuration {}", source.display());
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 800.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "EDX Explorer",
        options,
        Box::new(|_cc| Ok(Box::new(EdxExplorerApp::new(AppState::new(handle))))),
    )
}
