use std::path::PathBuf;

use edx_explorer::color::ColorMap;
use edx_explorer::config::{list_folders, ConfigHandle, EdxConfig};
use edx_explorer::data::index::ScanPosition;
use edx_explorer::data::model::SpectrumRecord;
use edx_explorer::figure::{Figure, Trace};
use edx_explorer::render::{generate_heatmap, get_elements, read_spectrum, spectrum_figure};
use edx_explorer::EdxError;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: EdxConfig,

    /// Dataset folders found under the data root.
    pub folders: Vec<String>,
    pub folder: Option<String>,

    /// Selected scan point, always on a grid node.
    pub position: ScanPosition,

    /// Quantified elements of the selected folder.
    pub elements: Vec<String>,
    pub element: Option<String>,

    /// Plot descriptions currently on screen.
    pub spectrum: Figure,
    pub heatmap: Figure,

    /// Parsed file behind `spectrum`, for the quantification table.
    pub record: Option<SpectrumRecord>,

    /// Colour mapping of the current heatmap values.
    pub heatmap_colors: Option<ColorMap>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(handle: ConfigHandle) -> Self {
        for warning in &handle.warnings {
            log::warn!("{warning}");
        }
        let config = handle.config;
        let position = config.grid.snap(ScanPosition::new(0.0, 0.0));

        let mut state = Self {
            folders: list_folders(&config),
            config,
            folder: None,
            position,
            elements: Vec::new(),
            element: None,
            spectrum: Figure::empty_spectrum(),
            heatmap: Figure::empty_heatmap(),
            record: None,
            heatmap_colors: None,
            status_message: handle.warnings.first().cloned(),
        };
        log::info!(
            "Found {} datasets under {}",
            state.folders.len(),
            state.config.kind_dir().display()
        );
        if state.folders.len() == 1 {
            state.select_folder(state.folders.first().cloned());
        }
        state
    }

    /// Point the viewer at another data root and drop the current selection.
    pub fn set_data_root(&mut self, root: PathBuf) {
        self.config.data_root = root;
        self.reload();
    }

    /// Re-scan the data root and re-read the selected dataset.
    pub fn reload(&mut self) {
        self.folders = list_folders(&self.config);
        let keep = self
            .folder
            .clone()
            .filter(|folder| self.folders.contains(folder));
        self.select_folder(keep);
    }

    pub fn select_folder(&mut self, folder: Option<String>) {
        self.folder = folder;
        self.status_message = None;

        let result = get_elements(&self.config, self.folder.as_deref());
        self.elements = self.report(result.map_err(EdxError::from)).unwrap_or_default();
        if !self
            .element
            .as_ref()
            .is_some_and(|element| self.elements.contains(element))
        {
            self.element = self.elements.first().cloned();
        }

        self.refresh_spectrum();
        self.refresh_heatmap();
    }

    /// Select the grid node nearest to `position`.
    pub fn select_position(&mut self, position: ScanPosition) {
        let snapped = self.config.grid.snap(position);
        if snapped != self.position || self.record.is_none() {
            self.position = snapped;
            self.status_message = None;
            self.refresh_spectrum();
        }
    }

    pub fn select_element(&mut self, element: Option<String>) {
        self.element = element;
        self.refresh_heatmap();
    }

    fn refresh_spectrum(&mut self) {
        let result = self.load_spectrum();
        if self.report(result).is_none() {
            self.spectrum = Figure::empty_spectrum();
            self.record = None;
        }
    }

    fn load_spectrum(&mut self) -> Result<(), EdxError> {
        let record = read_spectrum(&self.config, self.folder.as_deref(), self.position)?;
        self.spectrum = match (&self.folder, &record) {
            (Some(folder), Some(record)) => spectrum_figure(record, folder, self.position),
            _ => Figure::empty_spectrum(),
        };
        self.record = record;
        Ok(())
    }

    fn refresh_heatmap(&mut self) {
        let result = generate_heatmap(
            &self.config,
            self.folder.as_deref(),
            self.element.as_deref(),
        );
        self.heatmap = self
            .report(result.map_err(EdxError::from))
            .unwrap_or_else(Figure::empty_heatmap);
        self.heatmap_colors = self.heatmap.data.iter().find_map(|trace| match trace {
            Trace::Heatmap { z, colorscale, .. } => {
                ColorMap::spanning(colorscale.unwrap_or_default(), z)
            }
            _ => None,
        });
    }

    /// Log a failure and surface it in the status line.
    fn report<T>(&mut self, result: Result<T, EdxError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                log::error!("{e}");
                self.status_message = Some(format!("Error: {e}"));
                None
            }
        }
    }
}
