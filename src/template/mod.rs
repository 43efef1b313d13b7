//! Template Model
//!
//! Typed description of a deck template: ordered slides, each declaring the
//! placeholders the pipeline must resolve. Placeholder types form a closed
//! enum; an unknown or mismatched variant is rejected at load time, before
//! any generation request can touch the template.
//!
//! Descriptors are immutable once loaded and cached by id for the process
//! lifetime (see [`repository`]).

pub mod repository;

pub use repository::TemplateRepository;

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{DeckError, Result};

// =============================================================================
// Placeholder Types
// =============================================================================

/// Closed set of placeholder content kinds.
///
/// The tag decides which extraction/render path handles the token; the
/// `ai_generate` flag on the definition decides whether the value comes from
/// direct extraction or from the LLM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderType {
    Text,
    Paragraph,
    BulletList,
    Kpi,
    KpiGroup,
    Table,
    ChartData,
    IncidentList,
    IncidentDetail,
    BarChart,
    PieChart,
    NativeTable,
}

impl PlaceholderType {
    /// Chart-typed placeholders produce `{categories, ...}` payloads and are
    /// rendered as native chart shapes.
    pub fn is_chart(&self) -> bool {
        matches!(self, Self::BarChart | Self::PieChart)
    }

    /// Structured payloads (never free text in the final SlideSpec).
    pub fn is_structured(&self) -> bool {
        self.is_chart() || matches!(self, Self::NativeTable)
    }
}

/// Value transform applied before formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    Uppercase,
    Lowercase,
    Percent,
}

// =============================================================================
// Chart / Table Configuration
// =============================================================================

/// Shape position in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapePosition {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

/// Configuration for `bar_chart` / `pie_chart` placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Dotted path to the chart's source mapping in the tenant input
    pub data_source: String,
    /// Field holding category labels (bar charts)
    #[serde(default)]
    pub x_field: Option<String>,
    /// Field holding the value series (bar charts)
    #[serde(default)]
    pub y_field: Option<String>,
    /// Display name for the value series
    #[serde(default)]
    pub series_name: Option<String>,
    #[serde(default)]
    pub position: Option<ShapePosition>,
}

/// One column of a `native_table` placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableColumn {
    pub header: String,
    /// Dotted path into each row mapping
    pub field: String,
    /// Optional per-column format (`percent`)
    #[serde(default)]
    pub format: Option<String>,
}

/// Configuration for `native_table` placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Dotted path to the list of row mappings
    pub data_source: String,
    /// Ordered columns
    pub columns: Vec<TableColumn>,
    #[serde(default)]
    pub max_rows: Option<usize>,
    #[serde(default)]
    pub position: Option<ShapePosition>,
}

// =============================================================================
// Placeholder Definition
// =============================================================================

/// One named unit of slide content declared by a template.
///
/// A single definition type with optional sub-structures per variant; only
/// the fields relevant to its own `type` tag are validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderDefinition {
    /// Token name, unique within its slide; matched as `{{TOKEN}}` in the deck
    pub token: String,
    #[serde(rename = "type")]
    pub placeholder_type: PlaceholderType,
    /// Whether the value is produced by the LLM instead of direct extraction
    #[serde(default)]
    pub ai_generate: bool,

    // --- direct extraction (ai_generate = false) ---
    /// Dotted path into the tenant input (or the `computed.` namespace)
    #[serde(default)]
    pub source: Option<String>,
    /// Value used when the source path resolves to nothing
    #[serde(default)]
    pub default: Option<Value>,
    /// Literal, `{field}` template, or named transform (`join_comma`)
    #[serde(default)]
    pub format: Option<String>,
    /// Applied before formatting
    #[serde(default)]
    pub transform: Option<Transform>,

    // --- AI generation (ai_generate = true) ---
    #[serde(default)]
    pub ai_instruction: Option<String>,
    #[serde(default)]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub max_items: Option<usize>,
    #[serde(default)]
    pub max_chars_per_item: Option<usize>,

    // --- numeric cross-validation ---
    /// Dotted path (or computed key) whose numeric value must match the
    /// rendered token; drift is reported as a warning
    #[serde(default)]
    pub validation: Option<String>,

    // --- structured payloads ---
    #[serde(default)]
    pub chart_config: Option<ChartConfig>,
    #[serde(default)]
    pub table_config: Option<TableConfig>,
}

impl PlaceholderDefinition {
    /// Validate the fields relevant to this placeholder's own `type` tag.
    fn validate(&self, slide_key: &str, path: &str) -> Result<()> {
        let fail = |message: String| {
            Err(DeckError::TemplateParse {
                path: path.to_string(),
                message: format!("slide '{}', token '{}': {}", slide_key, self.token, message),
            })
        };

        if self.token.is_empty() {
            return fail("empty token".to_string());
        }

        match self.placeholder_type {
            PlaceholderType::BarChart => {
                let Some(cfg) = &self.chart_config else {
                    return fail("bar_chart requires chart_config".to_string());
                };
                if cfg.x_field.is_none() || cfg.y_field.is_none() {
                    return fail("bar_chart requires x_field and y_field".to_string());
                }
                if self.ai_generate {
                    return fail("chart placeholders cannot be ai_generate".to_string());
                }
            }
            PlaceholderType::PieChart => {
                if self.chart_config.is_none() {
                    return fail("pie_chart requires chart_config".to_string());
                }
                if self.ai_generate {
                    return fail("chart placeholders cannot be ai_generate".to_string());
                }
            }
            PlaceholderType::NativeTable => {
                let Some(cfg) = &self.table_config else {
                    return fail("native_table requires table_config".to_string());
                };
                if cfg.columns.is_empty() {
                    return fail("native_table requires at least one column".to_string());
                }
                if self.ai_generate {
                    return fail("native_table placeholders cannot be ai_generate".to_string());
                }
            }
            _ => {
                if self.ai_generate {
                    if self.ai_instruction.is_none() {
                        return fail("ai_generate placeholder requires ai_instruction".to_string());
                    }
                } else if self.source.is_none() && self.default.is_none() {
                    return fail("extracted placeholder requires source or default".to_string());
                }
            }
        }

        Ok(())
    }
}

// =============================================================================
// Slide / Template Descriptors
// =============================================================================

/// One slide of a template: position, stable key, and declared placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideDefinition {
    /// 1-based position, defines render order
    pub slide_no: u32,
    /// Stable identifier, unique within the template
    pub slide_key: String,
    #[serde(default)]
    pub title: String,
    pub placeholders: Vec<PlaceholderDefinition>,
}

/// Report audience, driving the tone of AI-generated prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    #[default]
    Management,
    Technical,
}

impl std::fmt::Display for Audience {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Audience::Management => write!(f, "management"),
            Audience::Technical => write!(f, "technical"),
        }
    }
}

/// A fully validated template: ordered slides, each with typed placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDescriptor {
    pub template_id: String,
    #[serde(default)]
    pub audience: Audience,
    pub slides: Vec<SlideDefinition>,
}

impl TemplateDescriptor {
    /// Parse and validate a descriptor from JSON text.
    ///
    /// Slides are sorted by `slide_no` (out-of-order source declaration is
    /// tolerated); duplicate slide numbers, slide keys, or per-slide tokens
    /// are rejected, as is any placeholder whose variant-specific fields are
    /// incomplete.
    pub fn from_json(text: &str, path: &str) -> Result<Self> {
        let mut descriptor: TemplateDescriptor =
            serde_json::from_str(text).map_err(|e| DeckError::TemplateParse {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        descriptor.slides.sort_by_key(|s| s.slide_no);
        descriptor.validate(path)?;
        Ok(descriptor)
    }

    /// Load and validate a descriptor file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|_| DeckError::TemplateNotFound(path.display().to_string()))?;
        Self::from_json(&text, &path.display().to_string())
    }

    fn validate(&self, path: &str) -> Result<()> {
        if self.template_id.is_empty() {
            return Err(DeckError::TemplateParse {
                path: path.to_string(),
                message: "empty template_id".to_string(),
            });
        }

        let mut slide_nos = HashSet::new();
        let mut slide_keys = HashSet::new();
        for slide in &self.slides {
            if !slide_nos.insert(slide.slide_no) {
                return Err(DeckError::TemplateParse {
                    path: path.to_string(),
                    message: format!("duplicate slide_no {}", slide.slide_no),
                });
            }
            if !slide_keys.insert(slide.slide_key.as_str()) {
                return Err(DeckError::TemplateParse {
                    path: path.to_string(),
                    message: format!("duplicate slide_key '{}'", slide.slide_key),
                });
            }

            let mut tokens = HashSet::new();
            for ph in &slide.placeholders {
                if !tokens.insert(ph.token.as_str()) {
                    return Err(DeckError::TemplateParse {
                        path: path.to_string(),
                        message: format!(
                            "slide '{}': duplicate token '{}'",
                            slide.slide_key, ph.token
                        ),
                    });
                }
                ph.validate(&slide.slide_key, path)?;
            }
        }

        Ok(())
    }

    /// Look up a slide by key.
    pub fn find_slide(&self, slide_key: &str) -> Option<&SlideDefinition> {
        self.slides.iter().find(|s| s.slide_key == slide_key)
    }

    /// All AI-generated placeholders, grouped by slide.
    pub fn ai_placeholders(&self) -> impl Iterator<Item = (&SlideDefinition, &PlaceholderDefinition)> {
        self.slides
            .iter()
            .flat_map(|s| s.placeholders.iter().filter(|p| p.ai_generate).map(move |p| (s, p)))
    }

    /// All `(slide_key, token, validation_path)` triples designated for
    /// numeric cross-validation.
    pub fn validation_targets(&self) -> Vec<(&str, &str, &str)> {
        self.slides
            .iter()
            .flat_map(|s| {
                s.placeholders.iter().filter_map(|p| {
                    p.validation
                        .as_deref()
                        .map(|v| (s.slide_key.as_str(), p.token.as_str(), v))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_template(extra: &str) -> String {
        format!(
            r#"{{
                "template_id": "t1",
                "audience": "management",
                "slides": [
                    {{
                        "slide_no": 2,
                        "slide_key": "second",
                        "title": "Second",
                        "placeholders": [
                            {{"token": "A", "type": "text", "source": "tenant.name"}}
                        ]
                    }},
                    {{
                        "slide_no": 1,
                        "slide_key": "first",
                        "title": "First",
                        "placeholders": [{extra}]
                    }}
                ]
            }}"#
        )
    }

    #[test]
    fn test_slides_sorted_on_load() {
        let json = minimal_template(r#"{"token": "B", "type": "text", "source": "tenant.id"}"#);
        let tpl = TemplateDescriptor::from_json(&json, "test").unwrap();
        assert_eq!(tpl.slides[0].slide_key, "first");
        assert_eq!(tpl.slides[1].slide_key, "second");
    }

    #[test]
    fn test_unknown_type_rejected() {
        let json = minimal_template(r#"{"token": "B", "type": "hologram", "source": "x"}"#);
        assert!(TemplateDescriptor::from_json(&json, "test").is_err());
    }

    #[test]
    fn test_ai_placeholder_requires_instruction() {
        let json = minimal_template(r#"{"token": "B", "type": "paragraph", "ai_generate": true}"#);
        let err = TemplateDescriptor::from_json(&json, "test").unwrap_err();
        assert!(err.to_string().contains("ai_instruction"));
    }

    #[test]
    fn test_bar_chart_requires_fields() {
        let json = minimal_template(
            r#"{"token": "B", "type": "bar_chart",
                "chart_config": {"data_source": "alerts.trend_weekly"}}"#,
        );
        let err = TemplateDescriptor::from_json(&json, "test").unwrap_err();
        assert!(err.to_string().contains("x_field"));
    }

    #[test]
    fn test_duplicate_token_rejected() {
        let json = minimal_template(
            r#"{"token": "B", "type": "text", "source": "x"},
               {"token": "B", "type": "text", "source": "y"}"#,
        );
        let err = TemplateDescriptor::from_json(&json, "test").unwrap_err();
        assert!(err.to_string().contains("duplicate token"));
    }

    #[test]
    fn test_validation_targets() {
        let json = minimal_template(
            r#"{"token": "B", "type": "kpi", "source": "alerts.total",
                "validation": "alerts.total"}"#,
        );
        let tpl = TemplateDescriptor::from_json(&json, "test").unwrap();
        assert_eq!(tpl.validation_targets(), vec![("first", "B", "alerts.total")]);
    }
}
