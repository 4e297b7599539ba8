//! Reader for the per-dataset quantification workbook
//! (`Global spectrum results.xlsx`).

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{Data, Reader, Xlsx};

use super::model::{CellValue, QuantificationTable};
use crate::error::SummaryFileError;

/// Read the first worksheet of the workbook at `path`.
///
/// Returns `Ok(None)` when the file does not exist: a dataset without a
/// summary simply has nothing quantified.
pub fn read_summary_file(path: &Path) -> Result<Option<QuantificationTable>, SummaryFileError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::info!("No summary workbook at {}", path.display());
            return Ok(None);
        }
        Err(source) => {
            return Err(SummaryFileError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let workbook_error = |reason: String| SummaryFileError::Workbook {
        path: path.to_path_buf(),
        reason,
    };

    let mut workbook: Xlsx<_> =
        Xlsx::new(BufReader::new(file)).map_err(|e| workbook_error(e.to_string()))?;
    // First sheet, where exports keep their results; not the saved active sheet.
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| workbook_error("workbook has no worksheet".to_string()))?
        .map_err(|e| workbook_error(e.to_string()))?;

    // Ranges start at the first used cell; keep column numbers absolute.
    let leading_cols = range.start().map(|(_, col)| col as usize).unwrap_or(0);

    let rows: Vec<Vec<CellValue>> = range
        .rows()
        .map(|row| {
            std::iter::repeat(CellValue::Null)
                .take(leading_cols)
                .chain(row.iter().map(to_cell_value))
                .collect()
        })
        .collect();

    log::info!(
        "Loaded summary workbook {} ({} rows)",
        path.display(),
        rows.len()
    );
    Ok(Some(QuantificationTable::new(rows)))
}

fn to_cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Date(dt.as_f64().to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Date(s.clone()),
        Data::Error(e) => {
            log::warn!("Workbook cell holds an error value: {e:?}");
            CellValue::Null
        }
    }
}
