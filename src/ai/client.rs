//! LLM Client
//!
//! Chat-completions client for an OpenAI-compatible endpoint. The contract
//! is deliberately narrow: one system message plus one user message in,
//! raw response text out. Sanitization and parsing live in
//! [`super::sanitize`] / [`super::response`]; retries are applied by the
//! caller through [`super::retry::RetryPolicy`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::types::{DeckError, ErrorCategory, ErrorClassifier, LlmError, Result};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

// =============================================================================
// Client Contract
// =============================================================================

/// One system + one user message, requesting a JSON-object response.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatPrompt {
    pub system: String,
    pub user: String,
}

/// LLM call contract: prompt text in, raw response text out.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Perform one chat completion. Errors carry a retry category.
    async fn complete(&self, prompt: &ChatPrompt) -> std::result::Result<String, LlmError>;

    /// Client name for logging
    fn name(&self) -> &str;

    /// Model identity currently in use
    fn model(&self) -> &str;
}

/// Shared client handle for the pipeline.
pub type SharedClient = Arc<dyn LlmClient>;

// =============================================================================
// Client Configuration
// =============================================================================

/// Connection settings for the OpenAI-compatible endpoint.
///
/// The API key is redacted in debug output and held as a `SecretString` at
/// runtime.
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Model name
    pub model: String,
    /// API base URL
    #[serde(default)]
    pub api_base: Option<String>,
    /// API key; falls back to the `OPENAI_API_KEY` env var.
    /// Never serialized to output.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: usize,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_base: None,
            api_key: None,
            timeout_secs: 120,
            temperature: 0.3,
            max_tokens: 4096,
        }
    }
}

// =============================================================================
// OpenAI-Compatible Client
// =============================================================================

/// Chat-completions client with secure API key handling.
pub struct OpenAiClient {
    api_key: SecretString,
    api_base: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let api_key_str = config
            .api_key
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                DeckError::Config(
                    "LLM API key not found. Set OPENAI_API_KEY or llm.api_key".to_string(),
                )
            })?;

        let api_base = config
            .api_base
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DeckError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: SecretString::from(api_key_str),
            api_base,
            model: config.model,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client,
        })
    }

    fn build_request(&self, prompt: &ChatPrompt) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: prompt.system.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.user.clone(),
                },
            ],
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
            response_format: Some(ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, prompt: &ChatPrompt) -> std::result::Result<String, LlmError> {
        info!(model = %self.model, "requesting slide content generation");

        let request = self.build_request(prompt);
        let url = format!("{}/chat/completions", self.api_base);

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ErrorClassifier::classify_http_status(status, &body));
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|e| {
            LlmError::new(
                ErrorCategory::Parse,
                format!("malformed completion response: {}", e),
            )
        })?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::new(ErrorCategory::Parse, "no content in completion"))?;

        debug!(chars = content.len(), "received completion");
        Ok(content)
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
