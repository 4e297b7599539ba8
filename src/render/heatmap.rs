use crate::color::ColorScale;
use crate::config::EdxConfig;
use crate::data::model::{CellValue, QuantificationTable};
use crate::error::SummaryFileError;
use crate::figure::{Figure, Layout, Trace};

use super::read_table;

/// Concentration map of `element` over the scan grid of `folder`.
///
/// Empty when either selection is missing, the dataset has no workbook, or
/// the element was not quantified there.
pub fn generate_heatmap(
    config: &EdxConfig,
    folder: Option<&str>,
    element: Option<&str>,
) -> Result<Figure, SummaryFileError> {
    let Some(element) = element else {
        return Ok(Figure::empty_heatmap());
    };
    let Some(table) = read_table(config, folder)? else {
        return Ok(Figure::empty_heatmap());
    };
    if !table.element_options().iter().any(|e| e == element) {
        log::info!("Element {element} is not quantified in this dataset");
        return Ok(Figure::empty_heatmap());
    }
    Ok(heatmap_figure(config, &table, element))
}

/// Build the heatmap for `element` from an already loaded table.
///
/// Rows map back to positions through the grid; points off the sample
/// footprint are dropped, as are cells without a numeric value.
pub fn heatmap_figure(config: &EdxConfig, table: &QuantificationTable, element: &str) -> Figure {
    let Some(column) = table.column_of(element) else {
        return Figure::empty_heatmap();
    };

    let mut x = Vec::new();
    let mut y = Vec::new();
    let mut z = Vec::new();
    for (index, row) in table.scan_rows() {
        let position = config.grid.to_position(index);
        if !config.on_sample(position) {
            continue;
        }
        match row.get(column).and_then(CellValue::as_f64) {
            Some(value) => {
                x.push(position.x_mm);
                y.push(position.y_mm);
                z.push(value);
            }
            None => log::warn!("No {element} value for {}, skipped", index.label()),
        }
    }

    log::debug!("Heatmap for {element}: {} points", z.len());
    Figure {
        data: vec![Trace::Heatmap {
            x,
            y,
            z,
            colorscale: Some(ColorScale::Jet),
        }],
        layout: Layout {
            title: Some(format!("EDX Heatmap for element {element}")),
            ..Default::default()
        },
    }
}
