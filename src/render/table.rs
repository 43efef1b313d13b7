//! Table Shape Construction
//!
//! Builds a `rows+1 × columns` grid from a table payload: fixed header
//! style, alternating data-row fill for readability, numeric-looking cells
//! center-aligned and text left-aligned.

use crate::constants::render::{TABLE_ALT_ROW_FILL, TABLE_HEADER_FILL};
use crate::extract::TablePayload;
use crate::template::ShapePosition;

use super::document::{CellAlign, TableCell, TableRow, TableShape};

/// Numeric-looking cell values (plain numbers and percentages) are centered.
fn cell_align(text: &str) -> CellAlign {
    let trimmed = text.trim().trim_end_matches('%');
    if !trimmed.is_empty() && trimmed.parse::<f64>().is_ok() {
        CellAlign::Center
    } else {
        CellAlign::Left
    }
}

fn hex(color: u32) -> String {
    format!("#{:06X}", color)
}

/// Build a table shape from its payload.
pub fn build_table(payload: &TablePayload, position: ShapePosition) -> TableShape {
    let mut rows = Vec::with_capacity(payload.rows.len() + 1);

    rows.push(TableRow {
        cells: payload
            .headers
            .iter()
            .map(|h| TableCell {
                text: h.clone(),
                align: CellAlign::Center,
            })
            .collect(),
        fill: Some(hex(TABLE_HEADER_FILL)),
        header: true,
    });

    for (i, row) in payload.rows.iter().enumerate() {
        rows.push(TableRow {
            cells: row
                .iter()
                .map(|text| TableCell {
                    text: text.clone(),
                    align: cell_align(text),
                })
                .collect(),
            fill: (i % 2 == 1).then(|| hex(TABLE_ALT_ROW_FILL)),
            header: false,
        });
    }

    TableShape { position, rows }
}
