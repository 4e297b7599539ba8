//! The three query entry points used by a front end.
//!
//! Every call is a self-contained read → parse → describe pipeline; nothing
//! is cached between calls. Absent selections (`None`) never raise: they
//! yield a pre-sized empty [`Figure`](crate::figure::Figure) or an empty list.

mod heatmap;
mod spectrum;

pub use heatmap::{generate_heatmap, heatmap_figure};
pub use spectrum::{generate_spectrum, read_spectrum, spectrum_figure};

use crate::config::EdxConfig;
use crate::data::model::QuantificationTable;
use crate::data::summary::read_summary_file;
use crate::error::SummaryFileError;

/// Elements of `folder` that were quantified (not deconvoluted), in
/// workbook column order. Empty when no folder is selected or the dataset
/// has no summary workbook.
pub fn get_elements(
    config: &EdxConfig,
    folder: Option<&str>,
) -> Result<Vec<String>, SummaryFileError> {
    Ok(read_table(config, folder)?
        .map(|table| table.element_options())
        .unwrap_or_default())
}

/// The summary table of `folder`, or `None` when there is none to read.
pub fn read_table(
    config: &EdxConfig,
    folder: Option<&str>,
) -> Result<Option<QuantificationTable>, SummaryFileError> {
    match folder {
        Some(folder) => read_summary_file(&config.summary_path(folder)),
        None => Ok(None),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::fs;

    use tempfile::TempDir;

    use crate::config::EdxConfig;
    use crate::data::index::ScanIndex;
    use crate::data::summary::tests::{sample_rows, write_workbook};

    pub(crate) const FOLDER: &str = "wafer_01";

    /// Minimal `.spx` with three channels and one quantified element.
    pub(crate) fn spx_document(counts: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="WINDOWS-1252"?>
<TRTSpectrum>
  <ClassInstance Type="TRTSpectrum" Name="Spectrum">
    <Channels>{counts}</Channels>
    <ClassInstance Type="TRTSpectrumHeader">
      <CalibAbs>-0.5</CalibAbs>
      <CalibLin>0.01</CalibLin>
    </ClassInstance>
    <ClassInstance Type="TRTResult" Name="Results">
      <Result><Atom>26</Atom><AtomPercent>0.45</AtomPercent></Result>
    </ClassInstance>
  </ClassInstance>
</TRTSpectrum>
"#
        )
    }

    /// A data root with one dataset holding a workbook and one spectrum.
    pub(crate) fn dataset() -> (TempDir, EdxConfig) {
        let dir = tempfile::tempdir().unwrap();
        let config = EdxConfig {
            data_root: dir.path().to_path_buf(),
            ..Default::default()
        };
        fs::create_dir_all(config.dataset_dir(FOLDER)).unwrap();
        write_workbook(&config.summary_path(FOLDER), &sample_rows());
        fs::write(
            config.spectrum_path(FOLDER, ScanIndex::new(2, 1)),
            spx_document("4,10,6"),
        )
        .unwrap();
        (dir, config)
    }
}
