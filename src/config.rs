//! Instrument layout and data location.
//!
//! Configuration is optional: every field has a default matching the
//! instrument the exports come from, and a JSON file can override any subset.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::data::index::{ScanIndex, ScanPosition};

pub use crate::data::index::ScanGrid;

/// Environment variable pointing at a config file.
pub const CONFIG_ENV_VAR: &str = "EDX_EXPLORER_CONFIG";

/// Config file name looked up in the working directory.
const CONFIG_FILENAME: &str = "edx-explorer.json";

/// Name of the per-dataset quantification workbook.
pub const SUMMARY_FILENAME: &str = "Global spectrum results.xlsx";

// ---------------------------------------------------------------------------
// EdxConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EdxConfig {
    /// Directory holding one sub-directory per dataset kind.
    pub data_root: PathBuf,
    /// Dataset kind directory under `data_root`, e.g. `EDX`.
    pub dataset_kind: String,
    pub grid: ScanGrid,
    /// Points with `|x| + |y|` above this lie off the sample.
    pub sample_extent_mm: f64,
}

impl Default for EdxConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("./data"),
            dataset_kind: "EDX".to_string(),
            grid: ScanGrid::default(),
            sample_extent_mm: 60.0,
        }
    }
}

impl EdxConfig {
    /// Directory containing every dataset folder.
    pub fn kind_dir(&self) -> PathBuf {
        self.data_root.join(&self.dataset_kind)
    }

    pub fn dataset_dir(&self, folder: &str) -> PathBuf {
        self.kind_dir().join(folder)
    }

    pub fn spectrum_path(&self, folder: &str, index: ScanIndex) -> PathBuf {
        self.dataset_dir(folder).join(index.file_name())
    }

    pub fn summary_path(&self, folder: &str) -> PathBuf {
        self.dataset_dir(folder).join(SUMMARY_FILENAME)
    }

    /// Diamond-shaped sample footprint.
    pub fn on_sample(&self, position: ScanPosition) -> bool {
        position.x_mm.abs() + position.y_mm.abs() <= self.sample_extent_mm
    }

    /// Replace unusable values with defaults, reporting each replacement.
    fn sanitize(mut self, warnings: &mut Vec<String>) -> Self {
        let defaults = ScanGrid::default();
        let grid = &mut self.grid;
        for (name, value, fallback) in [
            ("grid.step_x", &mut grid.step_x, defaults.step_x),
            ("grid.step_y", &mut grid.step_y, defaults.step_y),
        ] {
            if !value.is_finite() || *value <= 0.0 {
                warnings.push(format!("{name} = {value} is not a positive step, using {fallback}"));
                *value = fallback;
            }
        }
        for (name, value, fallback) in [
            ("grid.start_x", &mut grid.start_x, defaults.start_x),
            ("grid.start_y", &mut grid.start_y, defaults.start_y),
        ] {
            if !value.is_finite() {
                warnings.push(format!("{name} is not finite, using {fallback}"));
                *value = fallback;
            }
        }
        if !self.sample_extent_mm.is_finite() || self.sample_extent_mm < 0.0 {
            warnings.push(format!(
                "sample_extent_mm = {} is invalid, using 60",
                self.sample_extent_mm
            ));
            self.sample_extent_mm = 60.0;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Loaded configuration together with where it came from.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    pub config: EdxConfig,
    pub source: Option<PathBuf>,
    pub warnings: Vec<String>,
}

/// Load configuration, falling back to defaults on any problem.
///
/// Candidates, first existing file wins: `custom_path`, `$EDX_EXPLORER_CONFIG`,
/// `./edx-explorer.json`.
pub fn load_config(custom_path: Option<&Path>) -> ConfigHandle {
    let mut warnings = Vec::new();

    for candidate in config_candidates(custom_path) {
        if !candidate.is_file() {
            continue;
        }
        let parsed = fs::read_to_string(&candidate)
            .map_err(|e| e.to_string())
            .and_then(|text| serde_json::from_str::<EdxConfig>(&text).map_err(|e| e.to_string()));
        match parsed {
            Ok(config) => {
                let config = config.sanitize(&mut warnings);
                log::info!("Loaded configuration from {}", candidate.display());
                return ConfigHandle {
                    config,
                    source: Some(candidate),
                    warnings,
                };
            }
            Err(e) => {
                warnings.push(format!("ignoring {}: {e}", candidate.display()));
            }
        }
    }

    ConfigHandle {
        config: EdxConfig::default(),
        source: None,
        warnings,
    }
}

fn config_candidates(custom_path: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(path) = custom_path {
        candidates.push(path.to_path_buf());
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
        candidates.push(PathBuf::from(path));
    }
    candidates.push(PathBuf::from(CONFIG_FILENAME));
    candidates
}

// ---------------------------------------------------------------------------
// Dataset discovery
// ---------------------------------------------------------------------------

/// Names of the dataset folders under `<data_root>/<dataset_kind>`, sorted.
/// A missing directory simply has no datasets.
pub fn list_folders(config: &EdxConfig) -> Vec<String> {
    let dir = config.kind_dir();
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!("No dataset directory at {}: {e}", dir.display());
            return Vec::new();
        }
    };

    let mut folders: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .collect();
    folders.sort();
    folders
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let config = EdxConfig::default();
        let path = config.spectrum_path("wafer_01", ScanIndex::new(2, 1));
        assert_eq!(path, PathBuf::from("./data/EDX/wafer_01/Spectrum_(2,1).spx"));
        assert_eq!(
            config.summary_path("wafer_01"),
            PathBuf::from("./data/EDX/wafer_01/Global spectrum results.xlsx")
        );
    }

    #[test]
    fn test_on_sample_is_a_diamond() {
        let config = EdxConfig::default();
        assert!(config.on_sample(ScanPosition::new(0.0, 0.0)));
        assert!(config.on_sample(ScanPosition::new(40.0, 20.0)));
        assert!(config.on_sample(ScanPosition::new(-30.0, -30.0)));
        assert!(!config.on_sample(ScanPosition::new(40.0, 25.0)));
        assert!(!config.on_sample(ScanPosition::new(-40.0, -40.0)));
    }

    #[test]
    fn test_partial_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        fs::write(
            &path,
            r#"{ "data_root": "/mnt/exports", "grid": { "step_x": 2.5 } }"#,
        )
        .unwrap();

        let handle = load_config(Some(&path));
        assert_eq!(handle.source.as_deref(), Some(path.as_path()));
        assert!(handle.warnings.is_empty());
        assert_eq!(handle.config.data_root, PathBuf::from("/mnt/exports"));
        assert_eq!(handle.config.dataset_kind, "EDX");
        assert_eq!(handle.config.grid.step_x, 2.5);
        assert_eq!(handle.config.grid.step_y, 5.0);
        assert_eq!(handle.config.sample_extent_mm, 60.0);
    }

    #[test]
    fn test_invalid_step_is_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad_step.json");
        fs::write(&path, r#"{ "grid": { "step_y": 0.0 } }"#).unwrap();

        let handle = load_config(Some(&path));
        assert_eq!(handle.config.grid.step_y, 5.0);
        assert_eq!(handle.warnings.len(), 1);
    }

    #[test]
    fn test_unparsable_config_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let handle = load_config(Some(&path));
        assert!(handle
            .warnings
            .iter()
            .any(|w| w.contains("broken.json")));
        assert_eq!(handle.config.grid, ScanGrid::default());
    }

    #[test]
    fn test_list_folders() {
        let dir = tempfile::tempdir().unwrap();
        let config = EdxConfig {
            data_root: dir.path().to_path_buf(),
            ..Default::default()
        };
        assert!(list_folders(&config).is_empty());

        fs::create_dir_all(config.dataset_dir("wafer_b")).unwrap();
        fs::create_dir_all(config.dataset_dir("wafer_a")).unwrap();
        fs::write(config.kind_dir().join("notes.txt"), "x").unwrap();
        assert_eq!(list_folders(&config), vec!["wafer_a", "wafer_b"]);
    }
}
