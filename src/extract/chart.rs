//! Chart Payload Extraction
//!
//! Builds the structured chart payloads stored in the SlideSpec. A shape
//! mismatch in the source data is an error here; the extractor downgrades it
//! to a logged warning and an empty payload so one bad chart never fails the
//! request.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::extract::SEVERITY_DISPLAY;
use crate::template::ChartConfig;
use crate::types::{DeckError, Result};

/// One value series of a bar chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

/// `{categories, series}` payload for `bar_chart` placeholders.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BarChartPayload {
    pub categories: Vec<String>,
    pub series: Vec<Series>,
}

/// `{categories, values}` payload for `pie_chart` placeholders.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PieChartPayload {
    pub categories: Vec<String>,
    pub values: Vec<f64>,
}

fn numbers(token: &str, field: &str, value: &Value) -> Result<Vec<f64>> {
    let Value::Array(items) = value else {
        return Err(DeckError::Payload {
            token: token.to_string(),
            message: format!("'{}' is not a sequence", field),
        });
    };
    items
        .iter()
        .map(|v| {
            v.as_f64().ok_or_else(|| DeckError::Payload {
                token: token.to_string(),
                message: format!("non-numeric value in '{}'", field),
            })
        })
        .collect()
}

fn labels(token: &str, field: &str, value: &Value) -> Result<Vec<String>> {
    let Value::Array(items) = value else {
        return Err(DeckError::Payload {
            token: token.to_string(),
            message: format!("'{}' is not a sequence", field),
        });
    };
    Ok(items.iter().map(super::format::stringify).collect())
}

/// Extract a bar chart from a mapping holding an x-field label list and a
/// y-field value list.
pub fn extract_bar_chart(token: &str, source: &Value, cfg: &ChartConfig) -> Result<BarChartPayload> {
    let Value::Object(map) = source else {
        return Err(DeckError::Payload {
            token: token.to_string(),
            message: "bar chart source is not a mapping".to_string(),
        });
    };

    // validated at template load
    let x_field = cfg.x_field.as_deref().unwrap_or_default();
    let y_field = cfg.y_field.as_deref().unwrap_or_default();

    let x = map.get(x_field).ok_or_else(|| DeckError::Payload {
        token: token.to_string(),
        message: format!("missing x field '{}'", x_field),
    })?;
    let y = map.get(y_field).ok_or_else(|| DeckError::Payload {
        token: token.to_string(),
        message: format!("missing y field '{}'", y_field),
    })?;

    let categories = labels(token, x_field, x)?;
    let values = numbers(token, y_field, y)?;
    if categories.len() != values.len() {
        return Err(DeckError::Payload {
            token: token.to_string(),
            message: format!(
                "category/value length mismatch ({} vs {})",
                categories.len(),
                values.len()
            ),
        });
    }

    let name = cfg
        .series_name
        .clone()
        .unwrap_or_else(|| y_field.to_string());

    Ok(BarChartPayload {
        categories,
        series: vec![Series { name, values }],
    })
}

/// Display name for a severity bucket key, falling back to the raw key.
pub fn severity_display(key: &str) -> &str {
    SEVERITY_DISPLAY
        .iter()
        .find(|(raw, _)| *raw == key)
        .map(|(_, display)| *display)
        .unwrap_or(key)
}

/// Extract a pie chart from a `category -> count` mapping, translating known
/// severity keys through the display-name table.
pub fn extract_pie_chart(token: &str, source: &Value) -> Result<PieChartPayload> {
    let Value::Object(map) = source else {
        return Err(DeckError::Payload {
            token: token.to_string(),
            message: "pie chart source is not a mapping".to_string(),
        });
    };

    let mut categories = Vec::with_capacity(map.len());
    let mut values = Vec::with_capacity(map.len());
    for (key, value) in map {
        let count = value.as_f64().ok_or_else(|| DeckError::Payload {
            token: token.to_string(),
            message: format!("non-numeric count for category '{}'", key),
        })?;
        categories.push(severity_display(key).to_string());
        values.push(count);
    }

    Ok(PieChartPayload { categories, values })
}
