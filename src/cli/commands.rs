//! CLI Command Handlers
//!
//! Each handler wires the configured pipeline to the filesystem layout from
//! `PathsConfig`: tenant inputs and deck templates in, slidespecs and
//! rendered decks out.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use console::style;
use serde_json::Value;
use tracing::info;

use crate::ai::{OpenAiClient, SharedClient};
use crate::config::{Config, ConfigLoader};
use crate::pipeline::{GenerationResult, ReportPipeline};
use crate::render::DeckDocument;
use crate::template::TemplateRepository;
use crate::types::{DeckError, Result, SlideSpec, TenantInput};

/// Configured pipeline plus the directory layout it reads and writes.
pub struct App {
    pub config: Config,
    pub pipeline: ReportPipeline,
}

impl App {
    pub fn from_config(config: Config) -> Result<Self> {
        let templates = Arc::new(TemplateRepository::new(&config.paths.templates_dir));

        let client: Option<SharedClient> = if config.llm.enabled {
            Some(Arc::new(OpenAiClient::new(config.llm.client_config())?))
        } else {
            None
        };

        let pipeline = ReportPipeline::new(templates, client)
            .with_retry_policy(config.llm.retry_policy());

        Ok(Self { config, pipeline })
    }

    fn load_tenant(&self, input_id: &str) -> Result<TenantInput> {
        let path = self.config.paths.input_file(input_id);
        if !path.exists() {
            return Err(DeckError::InputNotFound(input_id.to_string()));
        }
        TenantInput::load_from_file(&path)
    }
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        println!("  {} {}", style("warning:").yellow().bold(), warning);
    }
}

fn print_result(result: &GenerationResult) {
    println!(
        "{} {} ({} slides, {} extracted, {} AI, {} fallback)",
        style("✓").green().bold(),
        result.job_id,
        result.spec.slides.len(),
        result.stats.extracted,
        result.stats.ai_filled,
        result.stats.fallback_filled,
    );
    print_warnings(&result.warnings);
}

/// Full generation: extract, generate, validate, persist the slidespec, and
/// render the deck.
pub async fn generate(input_id: &str, template_id: &str, mock: bool) -> Result<()> {
    let app = App::from_config(ConfigLoader::load()?)?;
    let tenant = app.load_tenant(input_id)?;

    let mut result = app
        .pipeline
        .generate(input_id, &tenant, template_id, mock)
        .await?;

    let spec_path = app.config.paths.slidespec_file(input_id, template_id);
    result.spec.save(&spec_path)?;
    info!(path = %spec_path.display(), "slidespec saved");

    let deck_path = app.config.paths.deck_file(template_id);
    let mut deck = DeckDocument::load_from_file(&deck_path)?;
    let report = app.pipeline.render_spec(&result.spec, &mut deck)?;
    result.stats.rendered = result.stats.total.saturating_sub(report.skipped.len());
    result.warnings.extend(report.warnings);

    let rendered_path = app.config.paths.rendered_deck_file(input_id, template_id);
    deck.save(&rendered_path)?;

    print_result(&result);
    println!("  slidespec: {}", spec_path.display());
    println!("  deck:      {}", rendered_path.display());
    Ok(())
}

/// Re-render a persisted slidespec without invoking the LLM.
pub fn render(input_id: &str, template_id: &str) -> Result<()> {
    let app = App::from_config(ConfigLoader::load()?)?;

    let spec_path = app.config.paths.slidespec_file(input_id, template_id);
    let spec = SlideSpec::load_from_file(&spec_path)?;

    let deck_path = app.config.paths.deck_file(template_id);
    let mut deck = DeckDocument::load_from_file(&deck_path)?;
    let report = app.pipeline.render_spec(&spec, &mut deck)?;

    let rendered_path = app.config.paths.rendered_deck_file(input_id, template_id);
    deck.save(&rendered_path)?;

    println!("{} {}", style("✓").green().bold(), rendered_path.display());
    print_warnings(&report.warnings);
    Ok(())
}

/// Merge new content (a JSON object of token → value) into one slide of a
/// persisted spec, revalidate, and re-render.
pub fn rewrite(job_id: &str, slide_key: &str, content_file: &Path) -> Result<()> {
    let (input_id, template_id) = job_id.split_once(':').ok_or_else(|| {
        DeckError::SlideSpec("job id must be formatted as input_id:template_id".to_string())
    })?;

    let app = App::from_config(ConfigLoader::load()?)?;
    let tenant = app.load_tenant(input_id)?;

    let spec_path = app.config.paths.slidespec_file(input_id, template_id);
    let mut spec = SlideSpec::load_from_file(&spec_path)?;

    let text = std::fs::read_to_string(content_file)?;
    let new_content: BTreeMap<String, Value> = serde_json::from_str(&text)?;

    let warnings = app
        .pipeline
        .rewrite(&mut spec, slide_key, new_content, &tenant)?;
    spec.save(&spec_path)?;

    let deck_path = app.config.paths.deck_file(template_id);
    let mut deck = DeckDocument::load_from_file(&deck_path)?;
    app.pipeline.render_spec(&spec, &mut deck)?;
    deck.save(&app.config.paths.rendered_deck_file(input_id, template_id))?;

    println!(
        "{} rewrote slide '{}' of {}",
        style("✓").green().bold(),
        slide_key,
        job_id
    );
    print_warnings(&warnings);
    Ok(())
}

/// List template ids available in the configured templates directory.
pub fn templates() -> Result<()> {
    let app = App::from_config(ConfigLoader::load()?)?;
    let ids = app.pipeline.templates().list()?;

    if ids.is_empty() {
        println!("no templates in {}", app.config.paths.templates_dir.display());
        return Ok(());
    }
    for id in ids {
        let descriptor = app.pipeline.templates().get(&id)?;
        println!(
            "{}  ({} slides, {})",
            style(&id).bold(),
            descriptor.slides.len(),
            descriptor.audience
        );
    }
    Ok(())
}
