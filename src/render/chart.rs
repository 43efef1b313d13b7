//! Chart Shape Construction
//!
//! Builds native chart shapes from extracted payloads with deterministic
//! coloring: a severity-aware palette when category/series names match the
//! known severity vocabulary (raw keys or display names), otherwise a fixed
//! multi-series palette assigned in declaration order. Data labels are
//! always attached.

use crate::constants::render::{SERIES_COLORS, SEVERITY_COLORS};
use crate::extract::{BarChartPayload, PieChartPayload};
use crate::template::ShapePosition;

use super::document::{ChartKind, ChartSeries, ChartShape};

fn hex(color: u32) -> String {
    format!("#{:06X}", color)
}

/// Severity palette lookup matching raw keys and zh-CN display names.
pub fn severity_color(name: &str) -> Option<String> {
    SEVERITY_COLORS
        .iter()
        .find(|(raw, display, _)| *raw == name || *display == name)
        .map(|(_, _, color)| hex(*color))
}

/// Fixed palette color for the n-th series/category.
pub fn series_color(index: usize) -> String {
    hex(SERIES_COLORS[index % SERIES_COLORS.len()])
}

/// Deterministic color for a named series/category at a declaration index.
fn color_for(name: &str, index: usize) -> String {
    severity_color(name).unwrap_or_else(|| series_color(index))
}

/// Build a bar chart shape from its payload.
pub fn build_bar_chart(payload: &BarChartPayload, position: ShapePosition) -> ChartShape {
    let series = payload
        .series
        .iter()
        .enumerate()
        .map(|(i, s)| ChartSeries {
            name: s.name.clone(),
            values: s.values.clone(),
            color: Some(color_for(&s.name, i)),
            point_colors: None,
        })
        .collect();

    ChartShape {
        chart_kind: ChartKind::Bar,
        position,
        categories: payload.categories.clone(),
        series,
        data_labels: true,
    }
}

/// Build a pie chart shape from its payload, with per-point colors.
pub fn build_pie_chart(payload: &PieChartPayload, position: ShapePosition) -> ChartShape {
    let point_colors = payload
        .categories
        .iter()
        .enumerate()
        .map(|(i, name)| color_for(name, i))
        .collect();

    ChartShape {
        chart_kind: ChartKind::Pie,
        position,
        categories: payload.categories.clone(),
        series: vec![ChartSeries {
            name: String::new(),
            values: payload.values.clone(),
            color: None,
            point_colors: Some(point_colors),
        }],
        data_labels: true,
    }
}
