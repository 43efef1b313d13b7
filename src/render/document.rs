//! Deck Document Model
//!
//! The opaque per-slide document object the renderer mutates: slides exposing
//! shapes, text shapes containing paragraphs of text runs, plus native chart
//! and table shapes. The binary presentation format itself is an external
//! concern; this model is the serializable hand-off the external converter
//! consumes.
//!
//! The renderer never creates new text shapes - it only mutates runs of
//! existing ones and appends chart/table shapes at configured positions.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::template::ShapePosition;
use crate::types::{DeckError, Result};

// =============================================================================
// Text Shapes
// =============================================================================

/// A contiguous run of text with uniform styling.
///
/// Token markers are replaced per run; a token split across two runs is not
/// matched (known limitation of run-level substitution).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub runs: Vec<TextRun>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBox {
    pub paragraphs: Vec<Paragraph>,
}

// =============================================================================
// Chart Shapes
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    Pie,
}

/// One rendered value series with its assigned colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub name: String,
    pub values: Vec<f64>,
    /// Series color (bar charts)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Per-point colors (pie charts)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_colors: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartShape {
    pub chart_kind: ChartKind,
    pub position: ShapePosition,
    pub categories: Vec<String>,
    pub series: Vec<ChartSeries>,
    pub data_labels: bool,
}

// =============================================================================
// Table Shapes
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellAlign {
    Left,
    Center,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    pub text: String,
    pub align: CellAlign,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
    /// Row background fill as `#RRGGBB`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    pub header: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableShape {
    pub position: ShapePosition,
    pub rows: Vec<TableRow>,
}

// =============================================================================
// Slides and Deck
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    TextBox(TextBox),
    Chart(ChartShape),
    Table(TableShape),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideSurface {
    /// 1-based slide position, matching `SlideDefinition::slide_no`
    pub slide_no: u32,
    pub shapes: Vec<Shape>,
}

impl SlideSurface {
    /// Every text run of every text shape on this slide.
    pub fn text_runs_mut(&mut self) -> impl Iterator<Item = &mut TextRun> {
        self.shapes
            .iter_mut()
            .filter_map(|shape| match shape {
                Shape::TextBox(tb) => {
                    Some(tb.paragraphs.iter_mut().flat_map(|p| p.runs.iter_mut()))
                }
                _ => None,
            })
            .flatten()
    }
}

/// An externally-supplied deck template with `{{TOKEN}}` markers in its text
/// runs, filled in place by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckDocument {
    pub slides: Vec<SlideSurface>,
}

impl DeckDocument {
    /// Load a deck template. A missing or unreadable file is fatal to the
    /// request (the pipeline cannot render without it).
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| DeckError::DeckUnavailable {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|e| DeckError::DeckUnavailable {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Persist the rendered deck.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn find_slide_mut(&mut self, slide_no: u32) -> Option<&mut SlideSurface> {
        self.slides.iter_mut().find(|s| s.slide_no == slide_no)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn text_slide(slide_no: u32, runs: &[&str]) -> SlideSurface {
        SlideSurface {
            slide_no,
            shapes: vec![Shape::TextBox(TextBox {
                paragraphs: vec![Paragraph {
                    runs: runs.iter().map(|t| TextRun { text: t.to_string() }).collect(),
                }],
            })],
        }
    }

    #[test]
    fn test_deck_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deck.json");

        let deck = DeckDocument {
            slides: vec![text_slide(1, &["客户：", "{{CUSTOMER_NAME}}"])],
        };
        deck.save(&path).unwrap();
        let loaded = DeckDocument::load_from_file(&path).unwrap();
        assert_eq!(deck, loaded);
    }

    #[test]
    fn test_missing_deck_is_unavailable() {
        let err = DeckDocument::load_from_file(Path::new("/nonexistent/deck.json")).unwrap_err();
        assert!(matches!(err, DeckError::DeckUnavailable { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_text_runs_iteration() {
        let mut slide = text_slide(1, &["a", "b"]);
        assert_eq!(slide.text_runs_mut().count(), 2);
    }
}
