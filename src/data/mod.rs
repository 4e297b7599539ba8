/// Data layer: grid indexing, instrument file readers, and core types.
///
/// Architecture:
/// ```text
///  (x, y) mm ──► index ──► Spectrum_(i,j).spx ──► spx ──► SpectrumRecord
///
///  Global spectrum results.xlsx ──► summary ──► QuantificationTable
///                                                   │
///                                                   ▼
///                                   element options, Spectrum_(i,j) rows
///                                                   │
///                                        index ◄────┘ (i, j) → (x, y) mm
/// ```

pub mod index;
pub mod model;
pub mod spx;
pub mod summary;
