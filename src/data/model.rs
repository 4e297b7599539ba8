use std::fmt;

use serde::Serialize;

use super::index::ScanIndex;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the quantification workbook
// ---------------------------------------------------------------------------

/// A dynamically-typed spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Date/time kept as text for simplicity.
    Date(String),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Numeric reading of the cell. Text counts when it parses as a number,
    /// since some exports store quantities as strings.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// Spectrum – one .spx file
// ---------------------------------------------------------------------------

/// Energy axis and raw channel counts, one entry per detector channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Spectrum {
    /// Channel energies (x), strictly increasing for a positive energy step.
    pub energy: Vec<f64>,
    /// Counts per channel (y), same length as `energy`.
    pub counts: Vec<i64>,
}

impl Spectrum {
    /// Apply the channel → energy calibration to raw counts.
    /// Channel `k` (0-based) sits at `(k + 1) * energy_step + zero_energy`.
    pub fn from_counts(counts: Vec<i64>, calibration: Calibration) -> Self {
        let energy = (0..counts.len())
            .map(|k| (k + 1) as f64 * calibration.energy_step + calibration.zero_energy)
            .collect();
        Spectrum { energy, counts }
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Per-file constants converting channel index to energy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Calibration {
    /// `CalibLin`
    pub energy_step: f64,
    /// `CalibAbs`
    pub zero_energy: f64,
}

// ---------------------------------------------------------------------------
// Quantification results embedded in the .spx metadata
// ---------------------------------------------------------------------------

/// The attributes of a `Result` record that are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResultField {
    Atom,
    XLine,
    AtomPercent,
    MassPercent,
    NetIntens,
    Background,
    Sigma,
}

impl ResultField {
    pub const ALL: [ResultField; 7] = [
        ResultField::Atom,
        ResultField::XLine,
        ResultField::AtomPercent,
        ResultField::MassPercent,
        ResultField::NetIntens,
        ResultField::Background,
        ResultField::Sigma,
    ];

    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "Atom" => ResultField::Atom,
            "XLine" => ResultField::XLine,
            "AtomPercent" => ResultField::AtomPercent,
            "MassPercent" => ResultField::MassPercent,
            "NetIntens" => ResultField::NetIntens,
            "Background" => ResultField::Background,
            "Sigma" => ResultField::Sigma,
            _ => return None,
        })
    }

    pub fn tag(self) -> &'static str {
        match self {
            ResultField::Atom => "Atom",
            ResultField::XLine => "XLine",
            ResultField::AtomPercent => "AtomPercent",
            ResultField::MassPercent => "MassPercent",
            ResultField::NetIntens => "NetIntens",
            ResultField::Background => "Background",
            ResultField::Sigma => "Sigma",
        }
    }

    /// Normalise a raw value for display. Atom numbers below 10 get a
    /// leading zero so they sort and align as two characters.
    pub fn normalize(self, raw: &str) -> String {
        let raw = raw.trim();
        match self {
            ResultField::Atom => match raw.parse::<i64>() {
                Ok(n) if (0..10).contains(&n) => format!("{n:02}"),
                _ => raw.to_string(),
            },
            _ => raw.to_string(),
        }
    }
}

impl fmt::Display for ResultField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One `Result` record: field → value in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuantificationResult {
    pub fields: Vec<(ResultField, String)>,
}

impl QuantificationResult {
    pub fn get(&self, field: ResultField) -> Option<&str> {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v.as_str())
    }
}

/// An element declared in the file's `Elements` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementEntry {
    pub atomic_number: u32,
    pub name: String,
}

/// Everything read from one `.spx` file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpectrumRecord {
    pub spectrum: Spectrum,
    pub calibration: Calibration,
    /// `PrimaryEnergy`, accelerating voltage in kV.
    pub primary_energy_kv: Option<i64>,
    /// `WorkingDistance` in mm.
    pub working_distance_mm: Option<f64>,
    pub results: Vec<QuantificationResult>,
    pub elements: Vec<ElementEntry>,
}

// ---------------------------------------------------------------------------
// QuantificationTable – the summary workbook
// ---------------------------------------------------------------------------

/// Full content of the summary workbook, rows in file order.
///
/// Layout: row 0 is the header (`Spectrum`, then one element symbol per
/// column), then one `Spectrum_(i,j)` row per scan point, and a block of
/// statistics rows at the end whose third-from-last row holds per-element
/// totals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuantificationTable {
    pub rows: Vec<Vec<CellValue>>,
}

/// Offset of the totals row from the end of the table.
const TOTALS_FROM_END: usize = 3;

impl QuantificationTable {
    pub fn new(rows: Vec<Vec<CellValue>>) -> Self {
        Self { rows }
    }

    pub fn header(&self) -> Option<&[CellValue]> {
        self.rows.first().map(Vec::as_slice)
    }

    pub fn totals_row(&self) -> Option<&[CellValue]> {
        let n = self.rows.len();
        if n < TOTALS_FROM_END {
            return None;
        }
        self.rows.get(n - TOTALS_FROM_END).map(Vec::as_slice)
    }

    /// Elements that were quantified rather than deconvoluted: header
    /// columns whose totals cell is present and non-zero, in header order.
    pub fn element_options(&self) -> Vec<String> {
        let (Some(header), Some(totals)) = (self.header(), self.totals_row()) else {
            return Vec::new();
        };

        totals
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, cell)| !cell.is_null())
            .filter(|(col, cell)| match cell.as_f64() {
                Some(v) => v != 0.0,
                None => {
                    log::warn!("Totals cell in column {col} is not numeric: {cell}");
                    false
                }
            })
            .filter_map(|(col, _)| header.get(col))
            .filter(|name| !name.is_null())
            .map(|name| name.to_string())
            .collect()
    }

    /// Column holding `element`, looked up in the header row.
    pub fn column_of(&self, element: &str) -> Option<usize> {
        self.header()?
            .iter()
            .position(|cell| cell.to_string() == element)
    }

    /// Rows labelled `Spectrum_(i,j)` with their parsed scan index.
    pub fn scan_rows(&self) -> impl Iterator<Item = (ScanIndex, &[CellValue])> + '_ {
        self.rows.iter().skip(1).filter_map(|row| {
            let label = row.first()?.as_str()?;
            if !label.starts_with("Spectrum_") {
                return None;
            }
            match ScanIndex::from_label(label) {
                Some(index) => Some((index, row.as_slice())),
                None => {
                    log::warn!("Skipping row with unreadable label {label:?}");
                    None
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> CellValue {
        CellValue::String(v.to_string())
    }

    fn f(v: f64) -> CellValue {
        CellValue::Float(v)
    }

    fn sample_table() -> QuantificationTable {
        QuantificationTable::new(vec![
            vec![s("Spectrum"), s("O"), s("Fe"), s("C"), s("Co")],
            vec![s("Spectrum_(1,1)"), f(50.0), f(30.0), f(0.0), f(20.0)],
            vec![s("Spectrum_(2,1)"), f(48.0), f(32.0), f(0.0), f(20.0)],
            vec![s("Mean value:"), f(49.0), f(31.0), f(0.0), f(20.0)],
            vec![s("Sigma:"), f(1.0), f(1.0), CellValue::Null, f(0.0)],
            vec![s("Sigma mean:"), f(0.7), f(0.7), CellValue::Null, f(0.0)],
        ])
    }

    #[test]
    fn test_element_options_skip_zero_and_null() {
        let table = sample_table();
        // Totals row is "Mean value:" (3rd from last); C is zero.
        assert_eq!(table.element_options(), vec!["O", "Fe", "Co"]);

        let mut rows = sample_table().rows;
        rows[3][2] = CellValue::Null;
        rows[3][4] = s("1.5");
        let table = QuantificationTable::new(rows);
        assert_eq!(table.element_options(), vec!["O", "Co"]);
    }

    #[test]
    fn test_short_table_has_no_options() {
        let table = QuantificationTable::new(vec![vec![s("Spectrum"), s("O")]]);
        assert!(table.totals_row().is_none());
        assert!(table.element_options().is_empty());
        assert!(QuantificationTable::default().element_options().is_empty());
    }

    #[test]
    fn test_scan_rows_and_columns() {
        let table = sample_table();
        let indices: Vec<ScanIndex> = table.scan_rows().map(|(idx, _)| idx).collect();
        assert_eq!(indices, vec![ScanIndex::new(1, 1), ScanIndex::new(2, 1)]);
        assert_eq!(table.column_of("Fe"), Some(2));
        assert_eq!(table.column_of("Zn"), None);
    }

    #[test]
    fn test_atom_number_padding() {
        assert_eq!(ResultField::Atom.normalize("7"), "07");
        assert_eq!(ResultField::Atom.normalize("0"), "00");
        assert_eq!(ResultField::Atom.normalize("26"), "26");
        assert_eq!(ResultField::Atom.normalize("10"), "10");
        assert_eq!(ResultField::AtomPercent.normalize("7"), "7");
    }

    #[test]
    fn test_field_tags_round_trip() {
        for field in ResultField::ALL {
            assert_eq!(ResultField::from_tag(field.tag()), Some(field));
        }
        assert_eq!(ResultField::from_tag("ExtResults"), None);
    }

    #[test]
    fn test_calibrated_energy_axis() {
        let spectrum = Spectrum::from_counts(
            vec![3, 9, 4],
            Calibration {
                energy_step: 10.0,
                zero_energy: -5.0,
            },
        );
        assert_eq!(spectrum.energy, vec![5.0, 15.0, 25.0]);
        assert_eq!(spectrum.counts, vec![3, 9, 4]);
    }
}
