//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/deckforge/) and project (.deckforge/) level
//! configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ai::ClientConfig;
use crate::ai::RetryPolicy;
use crate::constants::retry as retry_constants;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// LLM endpoint settings
    pub llm: LlmConfig,

    /// Data directory layout
    pub paths: PathsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            llm: LlmConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `DeckError::Config` on validation failure.
    pub fn validate(&self) -> crate::types::Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(crate::types::DeckError::Config(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(crate::types::DeckError::Config(
                "llm.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.llm.max_attempts == 0 {
            return Err(crate::types::DeckError::Config(
                "llm.max_attempts must be greater than 0".to_string(),
            ));
        }

        if let Some(api_base) = &self.llm.api_base
            && url::Url::parse(api_base).is_err()
        {
            return Err(crate::types::DeckError::Config(format!(
                "llm.api_base is not a valid URL: {}",
                api_base
            )));
        }

        Ok(())
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Master switch; when false every AI placeholder gets fallback content
    pub enabled: bool,

    /// Model name at the OpenAI-compatible endpoint
    pub model: String,

    /// API base URL override
    pub api_base: Option<String>,

    /// API key; prefer the OPENAI_API_KEY env var.
    /// Never serialized to output.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum tokens to generate
    pub max_tokens: usize,

    /// Retry attempts per generation call
    pub max_attempts: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model: "gpt-4o-mini".to_string(),
            api_base: None,
            api_key: None,
            timeout_secs: 120,
            temperature: 0.3,
            max_tokens: 4096,
            max_attempts: retry_constants::DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl LlmConfig {
    /// Client connection settings.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            model: self.model.clone(),
            api_base: self.api_base.clone(),
            api_key: self.api_key.clone(),
            timeout_secs: self.timeout_secs,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Retry policy for generation calls.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            ..RetryPolicy::default()
        }
    }
}

// =============================================================================
// Paths Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Template descriptors, one JSON file per template
    pub templates_dir: PathBuf,

    /// Tenant input documents
    pub inputs_dir: PathBuf,

    /// Deck document templates (`<template_id>.deck.json`)
    pub decks_dir: PathBuf,

    /// Generated slidespecs and rendered decks
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from("data/templates"),
            inputs_dir: PathBuf::from("data/inputs"),
            decks_dir: PathBuf::from("data/decks"),
            output_dir: PathBuf::from("outputs"),
        }
    }
}

impl PathsConfig {
    /// Tenant input file for an input id.
    pub fn input_file(&self, input_id: &str) -> PathBuf {
        self.inputs_dir.join(format!("{}.json", input_id))
    }

    /// Deck document template for a template id.
    pub fn deck_file(&self, template_id: &str) -> PathBuf {
        self.decks_dir.join(format!("{}.deck.json", template_id))
    }

    /// Persisted slidespec path for a job.
    pub fn slidespec_file(&self, input_id: &str, template_id: &str) -> PathBuf {
        self.output_dir
            .join("slidespecs")
            .join(format!("{}_{}.json", input_id, template_id))
    }

    /// Rendered deck output path for a job.
    pub fn rendered_deck_file(&self, input_id: &str, template_id: &str) -> PathBuf {
        self.output_dir
            .join("decks")
            .join(format!("{}_{}.deck.json", input_id, template_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_temperature_range_enforced() {
        let mut config = Config::default();
        config.llm.temperature = 3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_base_must_be_url() {
        let mut config = Config::default();
        config.llm.api_base = Some("not a url".to_string());
        assert!(config.validate().is_err());

        config.llm.api_base = Some("https://llm.internal/v1".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_job_paths() {
        let paths = PathsConfig::default();
        assert_eq!(
            paths.slidespec_file("acme", "mss_exec"),
            PathBuf::from("outputs/slidespecs/acme_mss_exec.json")
        );
        assert_eq!(
            paths.deck_file("mss_exec"),
            PathBuf::from("data/decks/mss_exec.deck.json")
        );
    }
}
