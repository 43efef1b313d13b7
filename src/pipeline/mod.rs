//! Generation Pipeline
//!
//! The orchestrator sequencing one generation request: extract direct
//! placeholders → build the prompt from AI placeholders → call the LLM (or
//! skip when disabled/forced-mock) → merge results, falling back to
//! deterministic placeholder text on any failure → cross-validate numeric
//! tokens → render into the deck document.
//!
//! A generation call always returns a result carrying the SlideSpec and a
//! (possibly empty) list of warning strings; the only fatal conditions are a
//! missing input, a missing template, or an unavailable deck document.
//!
//! Each `(slide_key, token)` pair moves through a fixed fill-state machine:
//! pending → {extracted | ai_requested} → {ai_filled | fallback_filled} →
//! rendered. No state is revisited within one request.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::ai::{GeneratedSlides, RetryPolicy, SharedClient, SlidePromptBuilder, parse_response};
use crate::extract::DataExtractor;
use crate::render::{DeckDocument, DeckRenderer, RenderReport};
use crate::template::{TemplateDescriptor, TemplateRepository};
use crate::types::{DeckError, Result, SlideContent, SlideSpec, TenantInput};
use crate::validate::FactChecker;

// =============================================================================
// Fill States
// =============================================================================

/// Lifecycle of one `(slide_key, token)` pair within a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillState {
    Pending,
    Extracted,
    AiRequested,
    AiFilled,
    FallbackFilled,
    Rendered,
}

/// Per-request fill counters, surfaced alongside the result.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct FillStats {
    pub total: usize,
    pub extracted: usize,
    pub ai_filled: usize,
    pub fallback_filled: usize,
    pub rendered: usize,
}

type StateMap = BTreeMap<(String, String), FillState>;

fn tally(states: &StateMap) -> FillStats {
    let mut stats = FillStats {
        total: states.len(),
        ..FillStats::default()
    };
    for state in states.values() {
        match state {
            FillState::Extracted => stats.extracted += 1,
            FillState::AiFilled => stats.ai_filled += 1,
            FillState::FallbackFilled => stats.fallback_filled += 1,
            FillState::Rendered => stats.rendered += 1,
            _ => {}
        }
    }
    stats
}

// =============================================================================
// Results
// =============================================================================

/// Outcome of one generation request.
#[derive(Debug)]
pub struct GenerationResult {
    /// `input_id:template_id`
    pub job_id: String,
    pub spec: SlideSpec,
    /// Validation and render warnings; non-empty warnings still mean success
    pub warnings: Vec<String>,
    pub stats: FillStats,
    pub generated_at: DateTime<Utc>,
}

// =============================================================================
// Pipeline
// =============================================================================

/// Owns the template cache, the LLM client, and the render/validate stages.
pub struct ReportPipeline {
    templates: Arc<TemplateRepository>,
    client: Option<SharedClient>,
    retry: RetryPolicy,
    checker: FactChecker,
    renderer: DeckRenderer,
}

impl ReportPipeline {
    /// Build a pipeline. `client = None` disables AI generation entirely;
    /// every AI placeholder then receives fallback content.
    pub fn new(templates: Arc<TemplateRepository>, client: Option<SharedClient>) -> Self {
        Self {
            templates,
            client,
            retry: RetryPolicy::default(),
            checker: FactChecker::default(),
            renderer: DeckRenderer::new(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The template cache, for reload/clear operations.
    pub fn templates(&self) -> &TemplateRepository {
        &self.templates
    }

    /// Run extraction, AI generation, merge, and validation for one request.
    ///
    /// Rendering into a deck document is a separate step
    /// ([`Self::render_spec`]) so persisted specs can be re-rendered without
    /// the LLM.
    pub async fn generate(
        &self,
        input_id: &str,
        tenant: &TenantInput,
        template_id: &str,
        force_mock: bool,
    ) -> Result<GenerationResult> {
        let template = self.templates.get(template_id)?;
        let extractor = DataExtractor::new(tenant);

        let mut states: StateMap = template
            .slides
            .iter()
            .flat_map(|s| {
                s.placeholders
                    .iter()
                    .map(|p| ((s.slide_key.clone(), p.token.clone()), FillState::Pending))
            })
            .collect();

        // 1. direct extraction
        let mut extracted = extractor.extract(&template);
        for slide in &template.slides {
            for ph in slide.placeholders.iter().filter(|p| !p.ai_generate) {
                states.insert(
                    (slide.slide_key.clone(), ph.token.clone()),
                    FillState::Extracted,
                );
            }
        }

        // 2-3. prompt + LLM call (or skip)
        let ai_attempted = !force_mock && self.client.is_some();
        if ai_attempted {
            for slide in &template.slides {
                for ph in slide.placeholders.iter().filter(|p| p.ai_generate) {
                    states.insert(
                        (slide.slide_key.clone(), ph.token.clone()),
                        FillState::AiRequested,
                    );
                }
            }
        }
        let generated = self.generate_ai_content(&template, tenant, force_mock).await;

        // 4. merge, falling back where needed
        let mut spec = SlideSpec::new(template_id);
        for slide in &template.slides {
            let mut placeholders = extracted.remove(&slide.slide_key).unwrap_or_default();

            for ph in slide.placeholders.iter().filter(|p| p.ai_generate) {
                let key = (slide.slide_key.clone(), ph.token.clone());
                match generated
                    .as_ref()
                    .and_then(|g| g.get(&slide.slide_key, &ph.token))
                {
                    Some(value) => {
                        placeholders.insert(ph.token.clone(), value.clone());
                        states.insert(key, FillState::AiFilled);
                    }
                    None => {
                        placeholders.insert(
                            ph.token.clone(),
                            crate::ai::fallback_value(ph.placeholder_type),
                        );
                        states.insert(key, FillState::FallbackFilled);
                    }
                }
            }

            spec.slides.push(SlideContent {
                slide_no: slide.slide_no,
                slide_key: slide.slide_key.clone(),
                placeholders,
            });
        }

        ensure_complete(&template, &spec)?;

        // 5. numeric cross-validation
        let warnings = self.checker.check(&extractor, &template, &spec);
        if !warnings.is_empty() {
            warn!(
                job_id = format!("{}:{}", input_id, template_id),
                count = warnings.len(),
                "validation warnings"
            );
        }

        let stats = tally(&states);
        info!(
            template_id,
            ai_filled = stats.ai_filled,
            fallback_filled = stats.fallback_filled,
            "slidespec generated"
        );

        Ok(GenerationResult {
            job_id: format!("{}:{}", input_id, template_id),
            spec,
            warnings,
            stats,
            generated_at: Utc::now(),
        })
    }

    /// Render a (freshly generated or persisted) spec into a deck document.
    pub fn render_spec(&self, spec: &SlideSpec, deck: &mut DeckDocument) -> Result<RenderReport> {
        let template = self.templates.get(&spec.template_id)?;
        Ok(self.renderer.render(&template, spec, deck))
    }

    /// Merge new content into one slide of a persisted spec, then re-check
    /// numeric tokens. Returns the validation warnings.
    pub fn rewrite(
        &self,
        spec: &mut SlideSpec,
        slide_key: &str,
        new_content: BTreeMap<String, serde_json::Value>,
        tenant: &TenantInput,
    ) -> Result<Vec<String>> {
        let template = self.templates.get(&spec.template_id)?;
        if template.find_slide(slide_key).is_none() {
            return Err(DeckError::SlideSpec(format!(
                "slide '{}' not declared by template '{}'",
                slide_key, spec.template_id
            )));
        }

        spec.merge_slide(slide_key, new_content)?;

        let extractor = DataExtractor::new(tenant);
        Ok(self.checker.check(&extractor, &template, spec))
    }

    async fn generate_ai_content(
        &self,
        template: &TemplateDescriptor,
        tenant: &TenantInput,
        force_mock: bool,
    ) -> Option<GeneratedSlides> {
        if template.ai_placeholders().next().is_none() {
            return None;
        }
        if force_mock {
            info!("mock mode requested, skipping LLM call");
            return None;
        }
        let Some(client) = &self.client else {
            info!("AI generation disabled, using fallback content");
            return None;
        };

        let prompt = SlidePromptBuilder::new(template, tenant).build();
        let raw = self
            .retry
            .run("slide content generation", || client.complete(&prompt))
            .await;

        match raw {
            Ok(raw) => match parse_response(&raw) {
                Ok(generated) => Some(generated),
                Err(e) => {
                    warn!(error = %e, "response unusable, falling back");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "LLM call failed, falling back");
                None
            }
        }
    }
}

/// Invariant check before a spec leaves the pipeline: every `(slide_key,
/// token)` declared by the template holds exactly one value.
fn ensure_complete(template: &TemplateDescriptor, spec: &SlideSpec) -> Result<()> {
    for slide in &template.slides {
        let content = spec.get_slide(&slide.slide_key).ok_or_else(|| {
            DeckError::SlideSpec(format!("slide '{}' missing from spec", slide.slide_key))
        })?;
        for ph in &slide.placeholders {
            if !content.placeholders.contains_key(&ph.token) {
                return Err(DeckError::SlideSpec(format!(
                    "token '{}' missing from slide '{}'",
                    ph.token, slide.slide_key
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{ChatPrompt, LlmClient};
    use crate::types::{ErrorCategory, LlmError};
    use async_trait::async_trait;
    use serde_json::json;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    const TEMPLATE: &str = r#"{
        "template_id": "mss_exec",
        "audience": "management",
        "slides": [
            {
                "slide_no": 1, "slide_key": "cover", "title": "封面",
                "placeholders": [
                    {"token": "CUSTOMER_NAME", "type": "text", "source": "tenant.name"}
                ]
            },
            {
                "slide_no": 2, "slide_key": "summary", "title": "概览",
                "placeholders": [
                    {"token": "KPI_ALERTS_TOTAL", "type": "kpi",
                     "source": "alerts.total", "validation": "alerts.total"},
                    {"token": "SUMMARY_PARAGRAPH", "type": "paragraph",
                     "ai_generate": true, "ai_instruction": "总结态势",
                     "validation": "alerts.total"},
                    {"token": "KEY_INSIGHTS", "type": "bullet_list",
                     "ai_generate": true, "ai_instruction": "关键洞察"}
                ]
            }
        ]
    }"#;

    struct CannedClient {
        response: String,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmClient for CannedClient {
        async fn complete(&self, _prompt: &ChatPrompt) -> std::result::Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.response.clone())
        }
        fn name(&self) -> &str {
            "canned"
        }
        fn model(&self) -> &str {
            "test"
        }
    }

    struct FailingClient;

    #[async_trait]
    impl LlmClient for FailingClient {
        async fn complete(&self, _prompt: &ChatPrompt) -> std::result::Result<String, LlmError> {
            Err(LlmError::new(ErrorCategory::RateLimit, "429"))
        }
        fn name(&self) -> &str {
            "failing"
        }
        fn model(&self) -> &str {
            "test"
        }
    }

    fn pipeline(client: Option<SharedClient>) -> (TempDir, ReportPipeline) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("mss_exec.json"), TEMPLATE).unwrap();
        let repo = Arc::new(TemplateRepository::new(dir.path()));
        let pipeline = ReportPipeline::new(repo, client).with_retry_policy(RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
            connection_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        });
        (dir, pipeline)
    }

    fn tenant() -> TenantInput {
        TenantInput::new(json!({
            "tenant": {"name": "Acme"},
            "period": {"start": "2025-12-01", "end": "2025-12-31"},
            "alerts": {"total": 100}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_generate_with_ai_content() {
        let client = Arc::new(CannedClient {
            response: r#"{"slides": [{"slide_key": "summary",
                "placeholders": {"SUMMARY_PARAGRAPH": "本期共100起告警。",
                                 "KEY_INSIGHTS": ["态势平稳"]}}]}"#
                .to_string(),
            calls: AtomicUsize::new(0),
        });
        let (_dir, pipeline) = pipeline(Some(client.clone()));

        let result = pipeline
            .generate("acme", &tenant(), "mss_exec", false)
            .await
            .unwrap();

        assert_eq!(result.job_id, "acme:mss_exec");
        assert!(result.warnings.is_empty());
        assert_eq!(result.stats.ai_filled, 2);
        assert_eq!(result.stats.extracted, 2);
        assert_eq!(
            result.spec.get_slide("summary").unwrap().placeholders["SUMMARY_PARAGRAPH"],
            json!("本期共100起告警。")
        );
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fallback_completeness_when_disabled() {
        let (_dir, pipeline) = pipeline(None);

        let result = pipeline
            .generate("acme", &tenant(), "mss_exec", false)
            .await
            .unwrap();

        // every declared token present and non-empty
        for slide in &result.spec.slides {
            for (token, value) in &slide.placeholders {
                assert!(
                    !value.as_str().unwrap_or("x").is_empty(),
                    "empty value for {}",
                    token
                );
            }
        }
        assert_eq!(result.stats.fallback_filled, 2);
        // fallback content is distinct per type
        let summary = result.spec.get_slide("summary").unwrap();
        assert_ne!(
            summary.placeholders["SUMMARY_PARAGRAPH"],
            summary.placeholders["KEY_INSIGHTS"]
        );
    }

    #[tokio::test]
    async fn test_llm_failure_recovers_with_fallback() {
        let (_dir, pipeline) = pipeline(Some(Arc::new(FailingClient)));

        let result = pipeline
            .generate("acme", &tenant(), "mss_exec", false)
            .await
            .unwrap();

        assert_eq!(result.stats.fallback_filled, 2);
        assert_eq!(result.stats.ai_filled, 0);
    }

    #[tokio::test]
    async fn test_mock_mode_skips_client() {
        let client = Arc::new(CannedClient {
            response: "{}".to_string(),
            calls: AtomicUsize::new(0),
        });
        let (_dir, pipeline) = pipeline(Some(client.clone()));

        pipeline
            .generate("acme", &tenant(), "mss_exec", true)
            .await
            .unwrap();

        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_numeric_drift_warns_but_succeeds() {
        let client = Arc::new(CannedClient {
            response: r#"{"slides": [{"slide_key": "summary",
                "placeholders": {"SUMMARY_PARAGRAPH": "本期共监测到120起告警",
                                 "KEY_INSIGHTS": ["注意"]}}]}"#
                .to_string(),
            calls: AtomicUsize::new(0),
        });
        let (_dir, pipeline) = pipeline(Some(client));

        let result = pipeline
            .generate("acme", &tenant(), "mss_exec", false)
            .await
            .unwrap();

        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("SUMMARY_PARAGRAPH"));
    }

    #[tokio::test]
    async fn test_unknown_template_is_fatal() {
        let (_dir, pipeline) = pipeline(None);
        let err = pipeline
            .generate("acme", &tenant(), "nope", false)
            .await
            .unwrap_err();
        assert!(matches!(err, DeckError::TemplateNotFound(_)));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_rewrite_merges_and_revalidates() {
        let (_dir, pipeline) = pipeline(None);
        let tenant = tenant();
        let mut spec = pipeline
            .generate("acme", &tenant, "mss_exec", false)
            .await
            .unwrap()
            .spec;

        let warnings = pipeline
            .rewrite(
                &mut spec,
                "summary",
                BTreeMap::from([("SUMMARY_PARAGRAPH".to_string(), json!("告警共90起"))]),
                &tenant,
            )
            .unwrap();

        assert_eq!(
            spec.get_slide("summary").unwrap().placeholders["SUMMARY_PARAGRAPH"],
            json!("告警共90起")
        );
        // 90 != 100 drift detected on rewrite
        assert_eq!(warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_rewrite_rejects_undeclared_slide() {
        let (_dir, pipeline) = pipeline(None);
        let tenant = tenant();
        let mut spec = pipeline
            .generate("acme", &tenant, "mss_exec", false)
            .await
            .unwrap()
            .spec;

        assert!(
            pipeline
                .rewrite(&mut spec, "ghost", BTreeMap::new(), &tenant)
                .is_err()
        );
    }
}
