//! LLM Response Parsing
//!
//! Sanitizes and parses the model's JSON output into per-slide placeholder
//! values, and supplies the deterministic fallback content used when the
//! call or the parse fails. Parse failure is never fatal to a generation
//! request - the orchestrator fills every unresolved AI placeholder with
//! fallback text and proceeds.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use super::sanitize::sanitize_response;
use crate::constants::fallback;
use crate::template::PlaceholderType;
use crate::types::{DeckError, Result};

/// One slide's generated placeholder values.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedSlide {
    pub slide_key: String,
    #[serde(default)]
    pub placeholders: BTreeMap<String, Value>,
}

/// The model's full output: a `slides` list keyed by `slide_key`.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedSlides {
    pub slides: Vec<GeneratedSlide>,
}

impl GeneratedSlides {
    /// Look up a generated value. Null values count as absent.
    pub fn get(&self, slide_key: &str, token: &str) -> Option<&Value> {
        self.slides
            .iter()
            .find(|s| s.slide_key == slide_key)?
            .placeholders
            .get(token)
            .filter(|v| !v.is_null())
    }
}

/// Sanitize and parse a raw LLM response.
///
/// A response without a `slides` key is a hard parse failure.
pub fn parse_response(raw: &str) -> Result<GeneratedSlides> {
    let sanitized = sanitize_response(raw);

    let value: Value = serde_json::from_str(sanitized)
        .map_err(|e| DeckError::LlmGeneration(format!("response is not valid JSON: {}", e)))?;

    if value.get("slides").is_none() {
        return Err(DeckError::LlmGeneration(
            "response JSON is missing the 'slides' key".to_string(),
        ));
    }

    serde_json::from_value(value)
        .map_err(|e| DeckError::LlmGeneration(format!("unexpected slides shape: {}", e)))
}

/// Deterministic stand-in for an AI placeholder that could not be filled.
pub fn fallback_value(placeholder_type: PlaceholderType) -> Value {
    match placeholder_type {
        PlaceholderType::BulletList => Value::String(fallback::BULLET_LIST.to_string()),
        _ => Value::String(fallback::TEXT.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const RESPONSE: &str = r#"{
        "slides": [
            {"slide_key": "summary",
             "placeholders": {"SUMMARY_PARAGRAPH": "本期态势平稳。",
                              "KEY_INSIGHTS": ["洞察一", "洞察二"]}}
        ]
    }"#;

    #[test]
    fn test_parse_plain_response() {
        let parsed = parse_response(RESPONSE).unwrap();
        assert_eq!(
            parsed.get("summary", "SUMMARY_PARAGRAPH"),
            Some(&json!("本期态势平稳。"))
        );
        assert_eq!(
            parsed.get("summary", "KEY_INSIGHTS"),
            Some(&json!(["洞察一", "洞察二"]))
        );
    }

    #[test]
    fn test_parse_fenced_response() {
        let fenced = format!("```json\n{}\n```", RESPONSE);
        let parsed = parse_response(&fenced).unwrap();
        assert!(parsed.get("summary", "SUMMARY_PARAGRAPH").is_some());
    }

    #[test]
    fn test_missing_slides_key_is_hard_failure() {
        let err = parse_response(r#"{"content": "text"}"#).unwrap_err();
        assert!(matches!(err, DeckError::LlmGeneration(_)));
        assert!(err.to_string().contains("slides"));
    }

    #[test]
    fn test_non_json_is_hard_failure() {
        assert!(parse_response("抱歉，无法生成。").is_err());
    }

    #[test]
    fn test_null_value_counts_as_absent() {
        let parsed = parse_response(
            r#"{"slides": [{"slide_key": "s", "placeholders": {"T": null}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.get("s", "T"), None);
    }

    #[test]
    fn test_unknown_slide_or_token() {
        let parsed = parse_response(RESPONSE).unwrap();
        assert_eq!(parsed.get("missing", "SUMMARY_PARAGRAPH"), None);
        assert_eq!(parsed.get("summary", "MISSING"), None);
    }

    #[test]
    fn test_fallback_distinct_per_type() {
        let bullets = fallback_value(PlaceholderType::BulletList);
        let text = fallback_value(PlaceholderType::Paragraph);
        assert_ne!(bullets, text);
        assert_eq!(fallback_value(PlaceholderType::Kpi), text);
    }
}
