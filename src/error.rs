use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn one `.spx` file into a spectrum.
#[derive(Debug, Error)]
pub enum SpectrumFileError {
    #[error("spectrum file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read spectrum file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed spectrum file {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("spectrum file {} has no <{field}> value", path.display())]
    MissingField { path: PathBuf, field: &'static str },
}

/// Failure to read the quantification workbook once it is known to exist.
/// A missing workbook is not an error; readers report it as "no table".
#[derive(Debug, Error)]
pub enum SummaryFileError {
    #[error("failed to read summary file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse summary workbook {}: {reason}", path.display())]
    Workbook { path: PathBuf, reason: String },
}

#[derive(Debug, Error)]
pub enum EdxError {
    #[error(transparent)]
    Spectrum(#[from] SpectrumFileError),

    #[error(transparent)]
    Summary(#[from] SummaryFileError),
}
