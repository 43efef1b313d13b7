//! Data Extractor
//!
//! Resolves every non-AI placeholder straight from the tenant input: dotted
//! path lookup, transform + format, chart/table payload construction, and a
//! small fixed set of derived aggregates exposed under the synthetic
//! `computed.` path namespace.
//!
//! ## Modules
//!
//! - `path`: dotted-path resolver (with the `length` pseudo-field)
//! - `format`: transforms and `{field}` template substitution
//! - `chart`: bar/pie chart payload extraction
//! - `table`: native table payload extraction

pub mod chart;
pub mod format;
pub mod path;
pub mod table;

pub use chart::{BarChartPayload, PieChartPayload, Series};
pub use table::TablePayload;

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::template::{PlaceholderDefinition, PlaceholderType, TemplateDescriptor};
use crate::types::TenantInput;

/// Prefix of the synthetic path namespace for derived aggregates.
const COMPUTED_PREFIX: &str = "computed.";

/// Count of incidents matching a severity.
fn count_incidents(tenant: &TenantInput, severity: &str) -> usize {
    tenant
        .get("incidents")
        .and_then(Value::as_array)
        .map(|incidents| {
            incidents
                .iter()
                .filter(|i| i.get("severity").and_then(Value::as_str) == Some(severity))
                .count()
        })
        .unwrap_or(0)
}

fn sequence_len(tenant: &TenantInput, key: &str) -> usize {
    tenant.get(key).and_then(Value::as_array).map_or(0, Vec::len)
}

/// Resolves non-AI placeholders from one tenant's input.
pub struct DataExtractor<'a> {
    tenant: &'a TenantInput,
    derived: BTreeMap<String, Value>,
}

impl<'a> DataExtractor<'a> {
    pub fn new(tenant: &'a TenantInput) -> Self {
        let raw = tenant.raw();
        let derived = BTreeMap::from([
            (
                "alerts_total".to_string(),
                path::resolve(raw, "alerts.total").map_or(Value::Null, Cow::into_owned),
            ),
            ("incident_count".to_string(), json!(sequence_len(tenant, "incidents"))),
            ("incidents_high".to_string(), json!(count_incidents(tenant, "high"))),
            (
                "incidents_critical".to_string(),
                json!(count_incidents(tenant, "critical")),
            ),
            (
                "mttr_hours_avg".to_string(),
                path::resolve(raw, "mss_ops.mttr_hours_avg").map_or(Value::Null, Cow::into_owned),
            ),
            (
                "false_positive_rate".to_string(),
                path::resolve(raw, "alerts.false_positive_rate")
                    .map_or(Value::Null, Cow::into_owned),
            ),
            ("vuln_count".to_string(), json!(sequence_len(tenant, "vulnerabilities"))),
        ]);

        Self { tenant, derived }
    }

    /// Resolve a dotted path, routing `computed.*` to the derived aggregates.
    pub fn resolve(&self, source: &str) -> Option<Cow<'_, Value>> {
        if let Some(key) = source.strip_prefix(COMPUTED_PREFIX) {
            return match self.derived.get(key) {
                Some(Value::Null) | None => None,
                Some(value) => Some(Cow::Borrowed(value)),
            };
        }
        path::resolve(self.tenant.raw(), source)
    }

    /// Resolve a path (or computed key) as a number, for cross-validation.
    pub fn resolve_numeric(&self, source: &str) -> Option<f64> {
        match self.resolve(source)?.as_ref() {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Resolve every `ai_generate = false` placeholder of the template.
    ///
    /// Returns `slide_key -> {token -> value}`. Text-like values are final
    /// strings; chart/table values are structured payloads. Shape mismatches
    /// degrade to empty payloads and a warning, never a failure.
    pub fn extract(&self, template: &TemplateDescriptor) -> BTreeMap<String, BTreeMap<String, Value>> {
        let mut out = BTreeMap::new();

        for slide in &template.slides {
            let mut values = BTreeMap::new();
            for ph in slide.placeholders.iter().filter(|p| !p.ai_generate) {
                values.insert(ph.token.clone(), self.extract_placeholder(ph));
            }
            debug!(
                slide_key = %slide.slide_key,
                count = values.len(),
                "extracted direct placeholders"
            );
            out.insert(slide.slide_key.clone(), values);
        }

        out
    }

    fn extract_placeholder(&self, ph: &PlaceholderDefinition) -> Value {
        match ph.placeholder_type {
            PlaceholderType::BarChart => self.extract_bar(ph),
            PlaceholderType::PieChart => self.extract_pie(ph),
            PlaceholderType::NativeTable => self.extract_native_table(ph),
            _ => self.extract_text(ph),
        }
    }

    fn extract_text(&self, ph: &PlaceholderDefinition) -> Value {
        let resolved = ph.source.as_deref().and_then(|s| self.resolve(s));

        let value = match resolved {
            Some(value) => value,
            None => match &ph.default {
                Some(default) => Cow::Borrowed(default),
                None => {
                    debug!(token = %ph.token, source = ?ph.source, "source unresolved, empty value");
                    return Value::String(String::new());
                }
            },
        };

        let value = match ph.transform {
            Some(transform) => format::apply_transform(value, transform),
            None => value,
        };

        Value::String(format::format_value(value.as_ref(), ph.format.as_deref()))
    }

    fn extract_bar(&self, ph: &PlaceholderDefinition) -> Value {
        // chart_config presence validated at template load
        let Some(cfg) = &ph.chart_config else {
            return json!(BarChartPayload::default());
        };
        let payload = match self.resolve(&cfg.data_source) {
            Some(source) => chart::extract_bar_chart(&ph.token, source.as_ref(), cfg)
                .unwrap_or_else(|e| {
                    warn!(token = %ph.token, error = %e, "bar chart extraction failed");
                    BarChartPayload::default()
                }),
            None => {
                warn!(token = %ph.token, source = %cfg.data_source, "bar chart source missing");
                BarChartPayload::default()
            }
        };
        json!(payload)
    }

    fn extract_pie(&self, ph: &PlaceholderDefinition) -> Value {
        let Some(cfg) = &ph.chart_config else {
            return json!(PieChartPayload::default());
        };
        let payload = match self.resolve(&cfg.data_source) {
            Some(source) => chart::extract_pie_chart(&ph.token, source.as_ref()).unwrap_or_else(|e| {
                warn!(token = %ph.token, error = %e, "pie chart extraction failed");
                PieChartPayload::default()
            }),
            None => {
                warn!(token = %ph.token, source = %cfg.data_source, "pie chart source missing");
                PieChartPayload::default()
            }
        };
        json!(payload)
    }

    fn extract_native_table(&self, ph: &PlaceholderDefinition) -> Value {
        let Some(cfg) = &ph.table_config else {
            return json!(TablePayload::default());
        };
        let payload = match self.resolve(&cfg.data_source) {
            Some(source) => table::extract_table(&ph.token, source.as_ref(), cfg).unwrap_or_else(|e| {
                warn!(token = %ph.token, error = %e, "table extraction failed");
                TablePayload {
                    headers: cfg.columns.iter().map(|c| c.header.clone()).collect(),
                    rows: Vec::new(),
                }
            }),
            None => {
                warn!(token = %ph.token, source = %cfg.data_source, "table source missing");
                TablePayload {
                    headers: cfg.columns.iter().map(|c| c.header.clone()).collect(),
                    rows: Vec::new(),
                }
            }
        };
        json!(payload)
    }
}
