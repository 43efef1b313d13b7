//! Deckforge - AI-Driven Security Report Deck Generator
//!
//! Turns nested, schema-free per-tenant security telemetry into a fully
//! populated slide deck. A template declares, per slide, a set of
//! placeholders: some are filled by direct extraction from the input data
//! (with formatting/transform rules), some require LLM-generated prose, and
//! a few are structured chart/table payloads.
//!
//! ## Pipeline
//!
//! ```ignore
//! use deckforge::pipeline::ReportPipeline;
//! use deckforge::template::TemplateRepository;
//! use deckforge::types::TenantInput;
//!
//! let templates = Arc::new(TemplateRepository::new("data/templates"));
//! let pipeline = ReportPipeline::new(templates, None);
//! let result = pipeline.generate("acme", &tenant, "mss_executive_v2", false).await?;
//! // result.spec is complete even when the LLM is disabled or failing
//! ```
//!
//! ## Modules
//!
//! - [`template`]: typed slide/placeholder descriptors with load-time validation
//! - [`extract`]: dotted-path data extraction, formats, chart/table payloads
//! - [`ai`]: prompt construction, LLM client, retry policy, response handling
//! - [`validate`]: numeric cross-validation of rendered tokens
//! - [`render`]: token substitution and native chart/table construction
//! - [`pipeline`]: the orchestrator sequencing one generation request
//! - [`config`]: layered configuration

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod extract;
pub mod pipeline;
pub mod render;
pub mod template;
pub mod types;
pub mod validate;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader, LlmConfig, PathsConfig};

// Error Types
pub use types::error::{DeckError, ErrorCategory, ErrorClassifier, LlmError, Result};

// Data Model
pub use types::{SlideContent, SlideSpec, TenantInput};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use pipeline::{FillState, FillStats, GenerationResult, ReportPipeline};

// =============================================================================
// Component Re-exports
// =============================================================================

pub use ai::{
    ChatPrompt, ClientConfig, LlmClient, OpenAiClient, RetryPolicy, SharedClient,
    SlidePromptBuilder, sanitize_response,
};
pub use extract::DataExtractor;
pub use render::{DeckDocument, DeckRenderer};
pub use template::{TemplateDescriptor, TemplateRepository};
pub use validate::FactChecker;
