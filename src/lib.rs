//! Read-only exploration of EDX scan exports.
//!
//! Three stateless entry points live in [`render`]: a per-point spectrum
//! plot, the list of quantified elements of a dataset, and an element
//! concentration heatmap. Each call reads its source files fresh.

pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod figure;
pub mod render;

pub use config::{EdxConfig, ScanGrid};
pub use error::{EdxError, SpectrumFileError, SummaryFileError};
pub use figure::Figure;
pub use render::{generate_heatmap, generate_spectrum, get_elements, spectrum_figure};
