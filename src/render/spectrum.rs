use crate::config::EdxConfig;
use crate::data::index::ScanPosition;
use crate::data::model::SpectrumRecord;
use crate::data::spx::read_spectrum_file;
use crate::error::SpectrumFileError;
use crate::figure::{Figure, Layout, Trace};

const SPECTRUM_COLOR: &str = "purple";

/// Read the spectrum recorded at `position` in `folder`.
///
/// `Ok(None)` means no folder is selected. A selected folder without a
/// readable file for that position is an error.
pub fn read_spectrum(
    config: &EdxConfig,
    folder: Option<&str>,
    position: ScanPosition,
) -> Result<Option<SpectrumRecord>, SpectrumFileError> {
    let Some(folder) = folder else {
        return Ok(None);
    };
    let index = config.grid.to_index(position);
    let path = config.spectrum_path(folder, index);
    log::debug!("Reading spectrum {index} at {position} from {}", path.display());
    read_spectrum_file(&path).map(Some)
}

/// Line plot of one spectrum: energy (eV) against counts.
pub fn spectrum_figure(record: &SpectrumRecord, folder: &str, position: ScanPosition) -> Figure {
    let spectrum = &record.spectrum;
    Figure {
        data: vec![Trace::Scatter {
            x: spectrum.energy.clone(),
            y: spectrum.counts.iter().map(|&c| c as f64).collect(),
            marker_color: Some(SPECTRUM_COLOR.to_string()),
        }],
        layout: Layout {
            title: Some(format!("EDX Spectrum for {folder} at position {position}")),
            ..Default::default()
        },
    }
}

/// Spectrum plot for the scan point at `(x_mm, y_mm)` of `folder`.
///
/// Without a folder the pre-sized empty plot is returned and no file is
/// touched.
pub fn generate_spectrum(
    config: &EdxConfig,
    folder: Option<&str>,
    x_mm: f64,
    y_mm: f64,
) -> Result<Figure, SpectrumFileError> {
    let position = ScanPosition::new(x_mm, y_mm);
    match (folder, read_spectrum(config, folder, position)?) {
        (Some(folder), Some(record)) => Ok(spectrum_figure(&record, folder, position)),
        _ => Ok(Figure::empty_spectrum()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::fixtures::{dataset, FOLDER};

    #[test]
    fn test_no_folder_gives_empty_plot() {
        let config = EdxConfig::default();
        for (x, y) in [(-40.0, -40.0), (0.0, 0.0), (1e6, -1e6)] {
            let fig = generate_spectrum(&config, None, x, y).unwrap();
            assert_eq!(fig, Figure::empty_spectrum());
        }
    }

    #[test]
    fn test_spectrum_plot() {
        let (_dir, config) = dataset();
        let fig = generate_spectrum(&config, Some(FOLDER), -35.0, -40.0).unwrap();

        assert_eq!(
            fig.title(),
            Some("EDX Spectrum for wafer_01 at position (-35, -40)")
        );
        match &fig.data[..] {
            [Trace::Scatter { x, y, marker_color }] => {
                assert_eq!(y, &vec![4.0, 10.0, 6.0]);
                assert_eq!(x.len(), 3);
                assert!((x[0] - -0.49).abs() < 1e-12);
                assert!((x[2] - -0.47).abs() < 1e-12);
                assert_eq!(marker_color.as_deref(), Some("purple"));
            }
            other => panic!("unexpected traces {other:?}"),
        }
    }

    #[test]
    fn test_missing_spectrum_file_is_an_error() {
        let (_dir, config) = dataset();
        let err = generate_spectrum(&config, Some(FOLDER), 0.0, 0.0).unwrap_err();
        assert!(matches!(err, SpectrumFileError::NotFound { .. }));
        assert!(err.to_string().contains("Spectrum_(9,9).spx"));
    }

    #[test]
    fn test_record_carries_quantification() {
        let (_dir, config) = dataset();
        let record = read_spectrum(&config, Some(FOLDER), ScanPosition::new(-35.0, -40.0))
            .unwrap()
            .unwrap();
        assert_eq!(record.results.len(), 1);
        assert!(read_spectrum(&config, None, ScanPosition::new(0.0, 0.0))
            .unwrap()
            .is_none());
    }
}
