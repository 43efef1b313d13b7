//! Numeric Cross-Validation
//!
//! Cross-checks designated numeric tokens against the source data: for each
//! placeholder carrying a `validation` path, the expected number is resolved
//! from the tenant input (or a computed aggregate) and compared against the
//! first numeric substring of the rendered value, with absolute tolerance.
//!
//! Mismatches are reported as warnings, never failures - the goal is
//! instrumentation of drift between AI narrative and ground truth, not
//! rejection.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::constants::validation::TOLERANCE;
use crate::extract::DataExtractor;
use crate::template::TemplateDescriptor;
use crate::types::SlideSpec;

static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    // first numeric substring, embedded prose included
    Regex::new(r"-?\d+(?:\.\d+)?").expect("valid pattern")
});

/// Extract the first numeric substring of a rendered value.
fn first_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => NUMBER.find(s)?.as_str().parse().ok(),
        _ => None,
    }
}

/// Compares rendered numeric tokens against their source values.
pub struct FactChecker {
    tolerance: f64,
}

impl Default for FactChecker {
    fn default() -> Self {
        Self {
            tolerance: TOLERANCE,
        }
    }
}

impl FactChecker {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Check every validation target of the template against the spec.
    ///
    /// Returns warning strings naming the token, expected, and actual
    /// values; an empty list means every designated number matched.
    pub fn check(
        &self,
        extractor: &DataExtractor<'_>,
        template: &TemplateDescriptor,
        spec: &SlideSpec,
    ) -> Vec<String> {
        let mut warnings = Vec::new();

        for (slide_key, token, source) in template.validation_targets() {
            let Some(expected) = extractor.resolve_numeric(source) else {
                debug!(token, source, "validation source unresolvable, skipping");
                continue;
            };

            let Some(value) = spec.get_slide(slide_key).and_then(|s| s.placeholders.get(token))
            else {
                continue;
            };

            match first_number(value) {
                Some(actual) => {
                    if (expected - actual).abs() > self.tolerance {
                        warnings.push(format!(
                            "token '{}': rendered value {} differs from source {} = {}",
                            token, actual, source, expected
                        ));
                    }
                }
                None => {
                    warnings.push(format!(
                        "token '{}': no numeric value found to compare against source {} = {}",
                        token, source, expected
                    ));
                }
            }
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SlideContent, TenantInput};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn template() -> TemplateDescriptor {
        TemplateDescriptor::from_json(
            r#"{
                "template_id": "t", "audience": "management",
                "slides": [{
                    "slide_no": 1, "slide_key": "summary", "title": "概览",
                    "placeholders": [
                        {"token": "ALERT_NARRATIVE", "type": "paragraph",
                         "ai_generate": true, "ai_instruction": "总结告警情况",
                         "validation": "alerts.total"},
                        {"token": "INCIDENTS_HIGH", "type": "kpi",
                         "source": "computed.incidents_high",
                         "validation": "computed.incidents_high"}
                    ]
                }]
            }"#,
            "test",
        )
        .unwrap()
    }

    fn tenant() -> TenantInput {
        TenantInput::new(json!({
            "alerts": {"total": 100},
            "incidents": [{"severity": "high"}, {"severity": "high"}]
        }))
        .unwrap()
    }

    fn spec(narrative: &str) -> SlideSpec {
        SlideSpec {
            template_id: "t".to_string(),
            slides: vec![SlideContent {
                slide_no: 1,
                slide_key: "summary".to_string(),
                placeholders: BTreeMap::from([
                    ("ALERT_NARRATIVE".to_string(), json!(narrative)),
                    ("INCIDENTS_HIGH".to_string(), json!("2")),
                ]),
            }],
        }
    }

    #[test]
    fn test_matching_number_in_prose_passes() {
        let tenant = tenant();
        let extractor = DataExtractor::new(&tenant);
        let warnings = FactChecker::default().check(
            &extractor,
            &template(),
            &spec("本期共监测到100起告警"),
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_drift_produces_one_warning_naming_values() {
        let tenant = tenant();
        let extractor = DataExtractor::new(&tenant);
        let warnings =
            FactChecker::default().check(&extractor, &template(), &spec("本期共监测到120起告警"));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("ALERT_NARRATIVE"));
        assert!(warnings[0].contains("120"));
        assert!(warnings[0].contains("100"));
    }

    #[test]
    fn test_within_tolerance_passes() {
        let tenant = TenantInput::new(json!({
            "alerts": {"total": 100.004},
            "incidents": [{"severity": "high"}, {"severity": "high"}]
        }))
        .unwrap();
        let extractor = DataExtractor::new(&tenant);
        let warnings =
            FactChecker::default().check(&extractor, &template(), &spec("共100起"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_missing_number_warns() {
        let tenant = tenant();
        let extractor = DataExtractor::new(&tenant);
        let warnings =
            FactChecker::default().check(&extractor, &template(), &spec("告警情况良好"));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("no numeric value"));
    }

    #[test]
    fn test_computed_validation_source() {
        let tenant = tenant();
        let extractor = DataExtractor::new(&tenant);
        // INCIDENTS_HIGH carries "2", matching computed.incidents_high
        let warnings =
            FactChecker::default().check(&extractor, &template(), &spec("共100起"));
        assert!(warnings.is_empty());
    }
}
