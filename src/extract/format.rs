//! Value Formatting
//!
//! Turns resolved values into the strings injected into text placeholders.
//! Transforms apply before formatting; list values are formatted per item and
//! joined with bullet markers (or commas for `join_comma`); scalar `{field}`
//! templates substitute through the same dotted-path resolver.

use std::borrow::Cow;

use serde_json::Value;

use super::path;
use crate::template::Transform;

/// Stringify a leaf value the way it appears in slide text.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Apply a named transform to a resolved value.
///
/// `percent` multiplies by 100, rounds, and appends `%`; the case transforms
/// only touch strings.
pub fn apply_transform(value: Cow<'_, Value>, transform: Transform) -> Cow<'_, Value> {
    match transform {
        Transform::Percent => match value.as_ref() {
            Value::Number(n) => {
                let pct = n.as_f64().map(|v| (v * 100.0).round()).unwrap_or(0.0);
                Cow::Owned(Value::String(format!("{}%", pct as i64)))
            }
            _ => value,
        },
        Transform::Uppercase => match value.as_ref() {
            Value::String(s) => Cow::Owned(Value::String(s.to_uppercase())),
            _ => value,
        },
        Transform::Lowercase => match value.as_ref() {
            Value::String(s) => Cow::Owned(Value::String(s.to_lowercase())),
            _ => value,
        },
    }
}

/// Substitute every `{path}` span in `template` with the value resolved
/// against `scope`. Unresolvable paths substitute as empty strings.
pub fn render_template(template: &str, scope: &Value) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let field = &after[..close];
                if let Some(value) = path::resolve(scope, field) {
                    out.push_str(&stringify(value.as_ref()));
                }
                rest = &after[close + 1..];
            }
            None => {
                // unclosed brace, keep literally
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Format one item of a list value.
fn format_item(item: &Value, format: Option<&str>) -> String {
    match format {
        Some(template) if template.contains('{') => render_template(template, item),
        _ => stringify(item),
    }
}

/// Produce the final string for a resolved (transformed) value.
///
/// Lists join with bullet markers, or with commas when `format` is
/// `join_comma`; scalars with a `{field}` format substitute against the
/// scalar itself (named `value`) or, for mappings, against their fields.
pub fn format_value(value: &Value, format: Option<&str>) -> String {
    match value {
        Value::Array(items) => match format {
            Some("join_comma") => items
                .iter()
                .map(|item| format_item(item, None))
                .collect::<Vec<_>>()
                .join(", "),
            _ => items
                .iter()
                .map(|item| format!("• {}", format_item(item, format)))
                .collect::<Vec<_>>()
                .join("\n"),
        },
        scalar => match format {
            Some(template) if template.contains('{') => {
                if scalar.is_object() {
                    render_template(template, scalar)
                } else {
                    let scope = serde_json::json!({ "value": scalar });
                    render_template(template, &scope)
                }
            }
            _ => stringify(scalar),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_percent_transform() {
        let out = apply_transform(Cow::Owned(json!(0.42)), Transform::Percent);
        assert_eq!(out.as_ref(), &json!("42%"));
    }

    #[test]
    fn test_case_transforms() {
        let up = apply_transform(Cow::Owned(json!("internal")), Transform::Uppercase);
        assert_eq!(up.as_ref(), &json!("INTERNAL"));
        let down = apply_transform(Cow::Owned(json!("P0")), Transform::Lowercase);
        assert_eq!(down.as_ref(), &json!("p0"));
    }

    #[test]
    fn test_list_bullet_join_with_template() {
        let value = json!([
            {"category": "暴力破解", "count": 120},
            {"category": "钓鱼邮件", "count": 87}
        ]);
        let out = format_value(&value, Some("{category}: {count}"));
        assert_eq!(out, "• 暴力破解: 120\n• 钓鱼邮件: 87");
    }

    #[test]
    fn test_list_join_comma() {
        let value = json!(["Web", "邮件", "终端"]);
        assert_eq!(format_value(&value, Some("join_comma")), "Web, 邮件, 终端");
    }

    #[test]
    fn test_list_without_format_bullets_raw_items() {
        let value = json!(["MFA 未启用", "密钥未轮换"]);
        assert_eq!(format_value(&value, None), "• MFA 未启用\n• 密钥未轮换");
    }

    #[test]
    fn test_scalar_template_against_value() {
        let out = format_value(&json!(7.5), Some("平均 {value} 小时"));
        assert_eq!(out, "平均 7.5 小时");
    }

    #[test]
    fn test_scalar_template_against_mapping_fields() {
        let value = json!({"start": "2025-12-01", "end": "2025-12-31"});
        let out = format_value(&value, Some("{start} ~ {end}"));
        assert_eq!(out, "2025-12-01 ~ 2025-12-31");
    }

    #[test]
    fn test_unresolved_field_substitutes_empty() {
        let out = format_value(&json!({"a": 1}), Some("[{missing}]"));
        assert_eq!(out, "[]");
    }

    #[test]
    fn test_unclosed_brace_kept_literally() {
        assert_eq!(render_template("open {brace", &json!({})), "open {brace");
    }
}
