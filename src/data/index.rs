use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ScanPosition / ScanIndex
// ---------------------------------------------------------------------------

/// Physical stage position on the sample, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanPosition {
    pub x_mm: f64,
    pub y_mm: f64,
}

impl ScanPosition {
    pub fn new(x_mm: f64, y_mm: f64) -> Self {
        Self { x_mm, y_mm }
    }
}

impl fmt::Display for ScanPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x_mm, self.y_mm)
    }
}

/// 1-based scan counters as they appear in instrument file names,
/// e.g. `Spectrum_(3,12).spx`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScanIndex {
    pub i: i64,
    pub j: i64,
}

impl ScanIndex {
    pub fn new(i: i64, j: i64) -> Self {
        Self { i, j }
    }

    /// `Spectrum_(i,j)`, the label shared by the spectrum file and the
    /// summary workbook row.
    pub fn label(&self) -> String {
        format!("Spectrum_({},{})", self.i, self.j)
    }

    pub fn file_name(&self) -> String {
        format!("{}.spx", self.label())
    }

    /// Parse the counters out of a `Spectrum_(i,j)` row label.
    ///
    /// Only the text between the last `(` and the following `)` is looked at,
    /// so a decorated label such as `Spectrum_(2,5) (rescan)` is rejected.
    /// Workbook rows are filtered on the `Spectrum_` prefix before they get
    /// here (see `QuantificationTable::scan_rows`).
    pub fn from_label(label: &str) -> Option<Self> {
        let (_, tail) = label.rsplit_once('(')?;
        let inner = tail.split(')').next()?;
        let (i, j) = inner.split_once(',')?;
        Some(Self {
            i: i.trim().parse().ok()?,
            j: j.trim().parse().ok()?,
        })
    }
}

impl fmt::Display for ScanIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.i, self.j)
    }
}

// ---------------------------------------------------------------------------
// ScanGrid – the affine mapping between the two
// ---------------------------------------------------------------------------

/// Quotients closer than this to a whole number are taken as that number.
const NODE_TOLERANCE: f64 = 1e-9;

/// Number of steps from `start` to `coord`, with float noise around exact
/// grid nodes removed.
fn steps_from(start: f64, step: f64, coord: f64) -> f64 {
    let q = (coord - start) / step;
    let nearest = q.round();
    if (q - nearest).abs() < NODE_TOLERANCE {
        nearest
    } else {
        q
    }
}

/// Origin, pitch and extent of the acquisition grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanGrid {
    pub start_x: f64,
    pub start_y: f64,
    pub step_x: f64,
    pub step_y: f64,
    pub count_x: u32,
    pub count_y: u32,
}

impl Default for ScanGrid {
    fn default() -> Self {
        Self {
            start_x: -40.0,
            start_y: -40.0,
            step_x: 5.0,
            step_y: 5.0,
            count_x: 17,
            count_y: 17,
        }
    }
}

impl ScanGrid {
    /// Position → file counters: `i = floor((x - start_x) / step_x + 1)`.
    ///
    /// Off-grid positions still yield an index; whether a file exists for it
    /// is only discovered when the file is opened. Positions produced by
    /// [`ScanGrid::to_position`] always map back to their own index, even for
    /// steps such as `0.1` that have no exact binary representation.
    pub fn to_index(&self, position: ScanPosition) -> ScanIndex {
        ScanIndex {
            i: steps_from(self.start_x, self.step_x, position.x_mm).floor() as i64 + 1,
            j: steps_from(self.start_y, self.step_y, position.y_mm).floor() as i64 + 1,
        }
    }

    /// File counters → position: `x = (i - 1) * step_x + start_x`.
    pub fn to_position(&self, index: ScanIndex) -> ScanPosition {
        ScanPosition {
            x_mm: (index.i - 1) as f64 * self.step_x + self.start_x,
            y_mm: (index.j - 1) as f64 * self.step_y + self.start_y,
        }
    }

    /// Index of the grid node nearest to `position`, clamped to the grid.
    pub fn snap_index(&self, position: ScanPosition) -> ScanIndex {
        self.clamp(ScanIndex {
            i: steps_from(self.start_x, self.step_x, position.x_mm).round() as i64 + 1,
            j: steps_from(self.start_y, self.step_y, position.y_mm).round() as i64 + 1,
        })
    }

    /// Snap an arbitrary position to the nearest grid node.
    pub fn snap(&self, position: ScanPosition) -> ScanPosition {
        self.to_position(self.snap_index(position))
    }

    pub fn clamp(&self, index: ScanIndex) -> ScanIndex {
        ScanIndex {
            i: index.i.clamp(1, self.count_x.max(1) as i64),
            j: index.j.clamp(1, self.count_y.max(1) as i64),
        }
    }

    /// Every node of the grid, row by row (`j` outer, `i` inner).
    pub fn indices(&self) -> impl Iterator<Item = ScanIndex> + '_ {
        (1..=self.count_y as i64)
            .flat_map(move |j| (1..=self.count_x as i64).map(move |i| ScanIndex { i, j }))
    }

    pub fn positions(&self) -> impl Iterator<Item = ScanPosition> + '_ {
        self.indices().map(move |idx| self.to_position(idx))
    }

    /// Inclusive `(min, max)` of the x axis.
    pub fn x_range(&self) -> (f64, f64) {
        let last = self.start_x + self.step_x * (self.count_x.max(1) - 1) as f64;
        (self.start_x.min(last), self.start_x.max(last))
    }

    /// Inclusive `(min, max)` of the y axis.
    pub fn y_range(&self) -> (f64, f64) {
        let last = self.start_y + self.step_y * (self.count_y.max(1) - 1) as f64;
        (self.start_y.min(last), self.start_y.max(last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_maps_to_first_file() {
        let grid = ScanGrid::default();
        let idx = grid.to_index(ScanPosition::new(-40.0, -40.0));
        assert_eq!(idx, ScanIndex::new(1, 1));
        assert_eq!(idx.file_name(), "Spectrum_(1,1).spx");
    }

    #[test]
    fn test_one_step_in_x() {
        let grid = ScanGrid::default();
        assert_eq!(
            grid.to_index(ScanPosition::new(-35.0, -40.0)),
            ScanIndex::new(2, 1)
        );
    }

    #[test]
    fn test_round_trip_over_whole_grid() {
        let grid = ScanGrid::default();
        for pos in grid.positions() {
            let back = grid.to_position(grid.to_index(pos));
            assert_eq!(back, pos, "round trip failed for {pos}");
        }
        assert_eq!(grid.positions().count(), 17 * 17);
    }

    #[test]
    fn test_off_grid_position_still_indexes() {
        let grid = ScanGrid::default();
        // Between nodes rounds down, outside the grid keeps counting.
        assert_eq!(
            grid.to_index(ScanPosition::new(-37.5, -40.0)),
            ScanIndex::new(1, 1)
        );
        assert_eq!(
            grid.to_index(ScanPosition::new(45.0, -50.0)),
            ScanIndex::new(18, -1)
        );
    }

    #[test]
    fn test_fractional_steps_keep_their_index() {
        for step in [0.1, 0.2, 0.3, 0.7, 1.1, 2.2] {
            for start in [-4.0, -1.3, 0.0, -40.0] {
                let grid = ScanGrid {
                    start_x: start,
                    start_y: start,
                    step_x: step,
                    step_y: step,
                    count_x: 60,
                    count_y: 60,
                };
                for idx in grid.indices() {
                    let pos = grid.to_position(idx);
                    assert_eq!(grid.to_index(pos), idx, "step {step}, start {start}, at {pos}");
                    assert_eq!(grid.snap_index(pos), idx, "step {step}, start {start}, at {pos}");

                    // Clicking a little off the node lands back on it.
                    let nudged = ScanPosition::new(pos.x_mm + step * 0.3, pos.y_mm - step * 0.3);
                    assert_eq!(grid.to_index(grid.snap(nudged)), idx);
                }
            }
        }
        let grid = ScanGrid {
            start_x: -4.0,
            step_x: 0.1,
            ..Default::default()
        };
        assert_eq!(grid.to_index(grid.to_position(ScanIndex::new(4, 1))).i, 4);
    }

    #[test]
    fn test_label_parsing() {
        assert_eq!(
            ScanIndex::from_label("Spectrum_(3,12)"),
            Some(ScanIndex::new(3, 12))
        );
        assert_eq!(
            ScanIndex::from_label("Spectrum_( 4 , 5 )"),
            Some(ScanIndex::new(4, 5))
        );
        assert_eq!(ScanIndex::from_label("Spectrum"), None);
        assert_eq!(ScanIndex::from_label("Spectrum_(a,1)"), None);
        assert_eq!(ScanIndex::from_label("Spectrum_(2,5) (rescan)"), None);
        assert_eq!(ScanIndex::new(7, 2).label(), "Spectrum_(7,2)");
    }

    #[test]
    fn test_snap_and_ranges() {
        let grid = ScanGrid::default();
        assert_eq!(
            grid.snap(ScanPosition::new(-36.0, 2.4)),
            ScanPosition::new(-35.0, 0.0)
        );
        assert_eq!(
            grid.snap(ScanPosition::new(400.0, -400.0)),
            ScanPosition::new(40.0, -40.0)
        );
        assert_eq!(grid.x_range(), (-40.0, 40.0));
        assert_eq!(grid.y_range(), (-40.0, 40.0));
    }
}
