//! Document Renderer
//!
//! Injects a resolved SlideSpec into a deck document: text-like values
//! replace `{{TOKEN}}` markers inside existing text runs (per run - a token
//! split across two runs is not matched), chart and table payloads become
//! native shapes at their configured (or type-default) positions.
//!
//! A malformed chart/table payload logs a warning and skips that one
//! placeholder; it never aborts the slide or the deck.
//!
//! ## Modules
//!
//! - `document`: the opaque deck object model (shapes, runs, charts, tables)
//! - `chart`: chart shape construction and the severity-aware palette
//! - `table`: table grid construction

pub mod chart;
pub mod document;
pub mod table;

pub use document::{DeckDocument, Shape, SlideSurface};

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::{debug, warn};

use crate::constants::render::{DEFAULT_BAR_CHART_POS, DEFAULT_PIE_CHART_POS, DEFAULT_TABLE_POS};
use crate::extract::{BarChartPayload, PieChartPayload, TablePayload, format};
use crate::template::{
    PlaceholderDefinition, PlaceholderType, ShapePosition, SlideDefinition, TemplateDescriptor,
};
use crate::types::SlideSpec;

/// Outcome of one render pass.
#[derive(Debug, Default)]
pub struct RenderReport {
    /// Non-fatal issues (malformed payloads, missing slides)
    pub warnings: Vec<String>,
    /// `(slide_key, token)` pairs skipped due to payload problems
    pub skipped: BTreeSet<(String, String)>,
}

impl RenderReport {
    fn skip(&mut self, slide_key: &str, token: &str, message: String) {
        warn!(slide_key, token, %message, "placeholder skipped");
        self.warnings.push(message);
        self.skipped
            .insert((slide_key.to_string(), token.to_string()));
    }
}

fn default_position(placeholder_type: PlaceholderType) -> ShapePosition {
    let (left, top, width, height) = match placeholder_type {
        PlaceholderType::PieChart => DEFAULT_PIE_CHART_POS,
        PlaceholderType::NativeTable => DEFAULT_TABLE_POS,
        _ => DEFAULT_BAR_CHART_POS,
    };
    ShapePosition {
        left,
        top,
        width,
        height,
    }
}

/// Stringify a text-like placeholder value for run substitution.
///
/// AI-generated bullet arrays are assembled into a bullet list here; a
/// structured object on a text placeholder is a type mismatch.
fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::Object(_) => None,
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| format!("• {}", format::stringify(item)))
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        other => Some(format::stringify(other)),
    }
}

/// Fills deck documents from resolved SlideSpecs.
#[derive(Debug, Default)]
pub struct DeckRenderer;

impl DeckRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render every slide of the spec into the deck, in `slide_no` order.
    pub fn render(
        &self,
        template: &TemplateDescriptor,
        spec: &SlideSpec,
        deck: &mut DeckDocument,
    ) -> RenderReport {
        let mut report = RenderReport::default();

        for slide in &template.slides {
            let Some(content) = spec.get_slide(&slide.slide_key) else {
                report
                    .warnings
                    .push(format!("slide '{}' missing from spec", slide.slide_key));
                continue;
            };

            let Some(surface) = deck.find_slide_mut(slide.slide_no) else {
                report.warnings.push(format!(
                    "deck has no slide {} for '{}'",
                    slide.slide_no, slide.slide_key
                ));
                continue;
            };

            self.render_slide(slide, &content.placeholders, surface, &mut report);
        }

        report
    }

    fn render_slide(
        &self,
        slide: &SlideDefinition,
        values: &std::collections::BTreeMap<String, Value>,
        surface: &mut SlideSurface,
        report: &mut RenderReport,
    ) {
        // text-like tokens first: build the substitution mapping
        let mut mapping: Vec<(String, String)> = Vec::new();
        for ph in slide.placeholders.iter().filter(|p| !p.placeholder_type.is_structured()) {
            let Some(value) = values.get(&ph.token) else {
                report.skip(&slide.slide_key, &ph.token, format!("token '{}' has no value", ph.token));
                continue;
            };
            match text_value(value) {
                Some(text) => mapping.push((format!("{{{{{}}}}}", ph.token), text)),
                None => report.skip(
                    &slide.slide_key,
                    &ph.token,
                    format!("token '{}' holds a structured payload but is text-typed", ph.token),
                ),
            }
        }

        for run in surface.text_runs_mut() {
            for (marker, text) in &mapping {
                if run.text.contains(marker.as_str()) {
                    run.text = run.text.replace(marker.as_str(), text);
                }
            }
        }

        // chart/table tokens become new shapes
        for ph in slide.placeholders.iter().filter(|p| p.placeholder_type.is_structured()) {
            let Some(value) = values.get(&ph.token) else {
                report.skip(&slide.slide_key, &ph.token, format!("token '{}' has no value", ph.token));
                continue;
            };
            if let Some(shape) = self.build_shape(slide, ph, value, report) {
                surface.shapes.push(shape);
            }
        }
    }

    fn build_shape(
        &self,
        slide: &SlideDefinition,
        ph: &PlaceholderDefinition,
        value: &Value,
        report: &mut RenderReport,
    ) -> Option<Shape> {
        match ph.placeholder_type {
            PlaceholderType::BarChart => {
                let payload: BarChartPayload = match serde_json::from_value(value.clone()) {
                    Ok(payload) => payload,
                    Err(e) => {
                        report.skip(
                            &slide.slide_key,
                            &ph.token,
                            format!("malformed bar chart payload for '{}': {}", ph.token, e),
                        );
                        return None;
                    }
                };
                if payload.categories.is_empty() {
                    debug!(token = %ph.token, "empty bar chart payload, nothing to render");
                    return None;
                }
                let position = ph
                    .chart_config
                    .as_ref()
                    .and_then(|c| c.position)
                    .unwrap_or_else(|| default_position(ph.placeholder_type));
                Some(Shape::Chart(chart::build_bar_chart(&payload, position)))
            }
            PlaceholderType::PieChart => {
                let payload: PieChartPayload = match serde_json::from_value(value.clone()) {
                    Ok(payload) => payload,
                    Err(e) => {
                        report.skip(
                            &slide.slide_key,
                            &ph.token,
                            format!("malformed pie chart payload for '{}': {}", ph.token, e),
                        );
                        return None;
                    }
                };
                if payload.categories.is_empty() {
                    debug!(token = %ph.token, "empty pie chart payload, nothing to render");
                    return None;
                }
                let position = ph
                    .chart_config
                    .as_ref()
                    .and_then(|c| c.position)
                    .unwrap_or_else(|| default_position(ph.placeholder_type));
                Some(Shape::Chart(chart::build_pie_chart(&payload, position)))
            }
            PlaceholderType::NativeTable => {
                let payload: TablePayload = match serde_json::from_value(value.clone()) {
                    Ok(payload) => payload,
                    Err(e) => {
                        report.skip(
                            &slide.slide_key,
                            &ph.token,
                            format!("malformed table payload for '{}': {}", ph.token, e),
                        );
                        return None;
                    }
                };
                let position = ph
                    .table_config
                    .as_ref()
                    .and_then(|c| c.position)
                    .unwrap_or_else(|| default_position(ph.placeholder_type));
                Some(Shape::Table(table::build_table(&payload, position)))
            }
            _ => None,
        }
    }
}
