//! AI Integration Layer
//!
//! LLM-backed content generation for AI placeholders: prompt construction,
//! the chat-completions client, the retry policy, and response
//! sanitization/parsing with deterministic fallback content.

pub mod client;
pub mod prompt;
pub mod response;
pub mod retry;
pub mod sanitize;

pub use client::{ChatPrompt, ClientConfig, LlmClient, OpenAiClient, SharedClient};
pub use prompt::SlidePromptBuilder;
pub use response::{GeneratedSlides, fallback_value, parse_response};
pub use retry::RetryPolicy;
pub use sanitize::sanitize_response;
