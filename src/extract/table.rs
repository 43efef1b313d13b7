//! Table Payload Extraction
//!
//! Projects a list of row mappings into the `{headers, rows}` payload stored
//! for `native_table` placeholders, truncated to the configured row cap.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{format, path};
use crate::constants::extract::DEFAULT_MAX_ROWS;
use crate::template::TableConfig;
use crate::types::{DeckError, Result};

/// `{headers, rows}` payload for `native_table` placeholders.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TablePayload {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

fn project_cell(row: &Value, field: &str, fmt: Option<&str>) -> String {
    let Some(value) = path::resolve(row, field) else {
        return String::new();
    };
    match fmt {
        Some("percent") => match value.as_ref() {
            Value::Number(n) => {
                let pct = n.as_f64().map(|v| (v * 100.0).round()).unwrap_or(0.0);
                format!("{}%", pct as i64)
            }
            other => format::stringify(other),
        },
        _ => format::stringify(value.as_ref()),
    }
}

/// Extract a table from a list of row mappings, in source order.
pub fn extract_table(token: &str, source: &Value, cfg: &TableConfig) -> Result<TablePayload> {
    let Value::Array(items) = source else {
        return Err(DeckError::Payload {
            token: token.to_string(),
            message: "table source is not a sequence".to_string(),
        });
    };

    let max_rows = cfg.max_rows.unwrap_or(DEFAULT_MAX_ROWS);
    let headers: Vec<String> = cfg.columns.iter().map(|c| c.header.clone()).collect();

    let mut rows = Vec::with_capacity(items.len().min(max_rows));
    for item in items.iter().take(max_rows) {
        if !item.is_object() {
            return Err(DeckError::Payload {
                token: token.to_string(),
                message: "table row is not a mapping".to_string(),
            });
        }
        let row = cfg
            .columns
            .iter()
            .map(|col| project_cell(item, &col.field, col.format.as_deref()))
            .collect();
        rows.push(row);
    }

    Ok(TablePayload { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TableColumn;
    use serde_json::json;

    fn cfg(max_rows: Option<usize>) -> TableConfig {
        TableConfig {
            data_source: "alerts.top_rules".to_string(),
            columns: vec![
                TableColumn {
                    header: "规则".to_string(),
                    field: "rule".to_string(),
                    format: None,
                },
                TableColumn {
                    header: "次数".to_string(),
                    field: "count".to_string(),
                    format: None,
                },
                TableColumn {
                    header: "误报率".to_string(),
                    field: "fp_rate".to_string(),
                    format: Some("percent".to_string()),
                },
            ],
            max_rows,
            position: None,
        }
    }

    fn rows(n: usize) -> Value {
        Value::Array(
            (0..n)
                .map(|i| json!({"rule": format!("R{}", i), "count": i * 10, "fp_rate": 0.25}))
                .collect(),
        )
    }

    #[test]
    fn test_projection_in_configured_order() {
        let payload = extract_table("TOP", &rows(2), &cfg(None)).unwrap();
        assert_eq!(payload.headers, vec!["规则", "次数", "误报率"]);
        assert_eq!(payload.rows[0], vec!["R0", "0", "25%"]);
        assert_eq!(payload.rows[1], vec!["R1", "10", "25%"]);
    }

    #[test]
    fn test_truncated_to_max_rows_in_source_order() {
        let payload = extract_table("TOP", &rows(15), &cfg(Some(10))).unwrap();
        assert_eq!(payload.rows.len(), 10);
        assert_eq!(payload.rows[9][0], "R9");
    }

    #[test]
    fn test_default_row_cap() {
        let payload = extract_table("TOP", &rows(15), &cfg(None)).unwrap();
        assert_eq!(payload.rows.len(), DEFAULT_MAX_ROWS);
    }

    #[test]
    fn test_missing_field_becomes_empty_cell() {
        let source = json!([{"rule": "R0"}]);
        let payload = extract_table("TOP", &source, &cfg(None)).unwrap();
        assert_eq!(payload.rows[0], vec!["R0", "", ""]);
    }

    #[test]
    fn test_non_sequence_source_rejected() {
        assert!(extract_table("TOP", &json!({"rule": "R0"}), &cfg(None)).is_err());
    }
}
