//! Core Data Model
//!
//! Shared types crossing component boundaries:
//!
//! - [`TenantInput`]: read-only wrapper around the raw tenant telemetry JSON
//! - [`SlideSpec`] / [`SlideContent`]: the fully resolved placeholder map for
//!   one generation job - the persisted hand-off artifact between content
//!   generation and document rendering
//!
//! `SlideSpec` must round-trip through its persisted JSON form with no
//! information loss: rendering from a loaded spec never requires the LLM.

pub mod error;

pub use error::{DeckError, ErrorCategory, ErrorClassifier, LlmError, Result};

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Tenant Input
// =============================================================================

/// Raw per-tenant telemetry consumed by the pipeline.
///
/// Schema-free nested JSON; only documented top-level keys (`alerts`,
/// `incidents`, `mss_ops`, `vulnerabilities`, `tenant`, `period`, ...) are
/// semantically interpreted, everything else is accessed through dotted-path
/// lookups only.
#[derive(Debug, Clone)]
pub struct TenantInput {
    raw: Value,
}

impl TenantInput {
    /// Wrap a raw JSON document. The top level must be an object.
    pub fn new(raw: Value) -> Result<Self> {
        if !raw.is_object() {
            return Err(DeckError::SlideSpec(
                "tenant input must be a JSON object at the top level".to_string(),
            ));
        }
        Ok(Self { raw })
    }

    /// Load tenant input from a JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|_| DeckError::InputNotFound(path.display().to_string()))?;
        let raw: Value = serde_json::from_str(&text)?;
        Self::new(raw)
    }

    /// The raw document.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Top-level key lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }
}

// =============================================================================
// SlideSpec
// =============================================================================

/// Resolved content for one slide: every declared token mapped to its value.
///
/// Values for chart/table-typed tokens are structured payloads
/// (categories/values or headers/rows); text-like tokens hold strings or, for
/// AI-generated bullet lists, string arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideContent {
    pub slide_no: u32,
    pub slide_key: String,
    pub placeholders: BTreeMap<String, Value>,
}

/// The fully resolved placeholder map for one generation job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideSpec {
    pub template_id: String,
    pub slides: Vec<SlideContent>,
}

impl SlideSpec {
    /// Create an empty spec for a template.
    pub fn new(template_id: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            slides: Vec::new(),
        }
    }

    /// Load a persisted spec from a JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|_| DeckError::SlideSpec(format!("slidespec not found: {}", path.display())))?;
        let spec: SlideSpec = serde_json::from_str(&text)?;
        Ok(spec)
    }

    /// Persist to a JSON file, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }

    /// Look up a slide by key.
    pub fn get_slide(&self, slide_key: &str) -> Option<&SlideContent> {
        self.slides.iter().find(|s| s.slide_key == slide_key)
    }

    /// Mutable slide lookup.
    pub fn get_slide_mut(&mut self, slide_key: &str) -> Option<&mut SlideContent> {
        self.slides.iter_mut().find(|s| s.slide_key == slide_key)
    }

    /// Merge new content into an existing slide's placeholder map.
    ///
    /// Used by rewrite operations: keys present in `new_content` replace the
    /// stored values, everything else is untouched.
    pub fn merge_slide(
        &mut self,
        slide_key: &str,
        new_content: BTreeMap<String, Value>,
    ) -> Result<()> {
        let slide = self
            .get_slide_mut(slide_key)
            .ok_or_else(|| DeckError::SlideSpec(format!("slide '{}' not in spec", slide_key)))?;
        slide.placeholders.extend(new_content);
        Ok(())
    }

    /// Slides ordered by `slide_no`.
    pub fn sort_slides(&mut self) {
        self.slides.sort_by_key(|s| s.slide_no);
    }
}
