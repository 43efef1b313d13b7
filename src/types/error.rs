//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//! Provides error classification for retry decisions in the LLM client.
//!
//! ## Fatal vs. recovered
//!
//! Only precondition failures are fatal to a generation request:
//! - **InputNotFound** / **TemplateNotFound**: abort before the pipeline starts
//! - **DeckUnavailable**: the deck template file itself cannot be loaded
//!
//! Everything LLM-related (`LlmGeneration`, `Llm`) is recovered locally by
//! fallback-filling the affected placeholders; numeric drift is surfaced as
//! warning strings, never as an error.

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Error categories driving the LLM retry policy.
///
/// Rate-limit-class errors retry with exponential backoff, connection-class
/// errors retry with a fixed delay, everything else aborts immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rate limited - retry with exponential backoff
    RateLimit,
    /// Network/connectivity issues - retry with fixed delay
    Network,
    /// Authentication failed - fail fast, don't retry
    Auth,
    /// Invalid request - don't retry, fix request
    BadRequest,
    /// Endpoint unavailable - don't retry
    Unavailable,
    /// Parsing LLM response failed
    Parse,
    /// Unknown error - don't retry
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::Network => write!(f, "NETWORK"),
            Self::Auth => write!(f, "AUTH"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::Parse => write!(f, "PARSE"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl ErrorCategory {
    /// Check if this category is retryable at all
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimit | Self::Network)
    }

    /// Check if retries should use exponential backoff (vs. a fixed delay)
    pub fn uses_backoff(&self) -> bool {
        matches!(self, Self::RateLimit)
    }
}

// =============================================================================
// LLM Error
// =============================================================================

/// Structured LLM call error with category and retry hints
#[derive(Debug, Clone)]
pub struct LlmError {
    /// Error category for retry decisions
    pub category: ErrorCategory,
    /// Detailed error message
    pub message: String,
    /// Suggested wait time before retry (if applicable)
    pub retry_after: Option<Duration>,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    /// Create a new LLM error
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            retry_after: None,
        }
    }

    /// Add suggested retry delay
    pub fn retry_after(mut self, duration: Duration) -> Self {
        self.retry_after = Some(duration);
        self
    }

    /// Check if the error is retryable on the same endpoint
    pub fn is_retryable(&self) -> bool {
        self.category.is_retryable()
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Classifies raw transport/API errors into retry categories
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify an error message from the LLM endpoint
    pub fn classify(message: &str) -> LlmError {
        let lower = message.to_lowercase();

        // Rate limiting patterns
        if lower.contains("rate limit")
            || lower.contains("429")
            || lower.contains("too many requests")
            || lower.contains("quota exceeded")
        {
            return LlmError::new(ErrorCategory::RateLimit, message)
                .retry_after(Duration::from_secs(30));
        }

        // Authentication patterns
        if lower.contains("401")
            || lower.contains("403")
            || lower.contains("api key")
            || lower.contains("unauthorized")
            || lower.contains("permission denied")
        {
            return LlmError::new(ErrorCategory::Auth, message);
        }

        // Network patterns
        if lower.contains("connection")
            || lower.contains("network")
            || lower.contains("dns")
            || lower.contains("timeout")
            || lower.contains("timed out")
            || lower.contains("unreachable")
        {
            return LlmError::new(ErrorCategory::Network, message)
                .retry_after(Duration::from_secs(5));
        }

        // Bad request patterns
        if lower.contains("400") || lower.contains("bad request") || lower.contains("malformed") {
            return LlmError::new(ErrorCategory::BadRequest, message);
        }

        // Endpoint unavailable patterns
        if lower.contains("503")
            || lower.contains("502")
            || lower.contains("service unavailable")
            || lower.contains("not found")
        {
            return LlmError::new(ErrorCategory::Unavailable, message);
        }

        LlmError::new(ErrorCategory::Unknown, message)
    }

    /// Classify an HTTP status code directly (more accurate than string matching)
    pub fn classify_http_status(status: u16, message: &str) -> LlmError {
        match status {
            429 => LlmError::new(ErrorCategory::RateLimit, message)
                .retry_after(Duration::from_secs(30)),
            401 | 403 => LlmError::new(ErrorCategory::Auth, message),
            400 => LlmError::new(ErrorCategory::BadRequest, message),
            404 | 500 | 502 | 503 | 504 => LlmError::new(ErrorCategory::Unavailable, message),
            _ => LlmError::new(ErrorCategory::Unknown, message),
        }
    }

    /// Classify a reqwest transport error
    pub fn classify_transport(err: &reqwest::Error) -> LlmError {
        if err.is_timeout() || err.is_connect() {
            return LlmError::new(ErrorCategory::Network, err.to_string())
                .retry_after(Duration::from_secs(5));
        }
        if let Some(status) = err.status() {
            return Self::classify_http_status(status.as_u16(), &err.to_string());
        }
        Self::classify(&err.to_string())
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum DeckError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Precondition Errors (fatal to the request)
    // -------------------------------------------------------------------------
    #[error("Input '{0}' not found")]
    InputNotFound(String),

    #[error("Template '{0}' not found")]
    TemplateNotFound(String),

    #[error("Template descriptor error in {path}: {message}")]
    TemplateParse { path: String, message: String },

    #[error("Deck document unavailable: {path}: {message}")]
    DeckUnavailable { path: String, message: String },

    // -------------------------------------------------------------------------
    // LLM Errors (recovered via fallback fill, never fatal to generation)
    // -------------------------------------------------------------------------
    /// Structured LLM error with category and retry hints
    #[error("LLM error: {0}")]
    Llm(LlmError),

    /// Generation failure after the retry budget is exhausted or the
    /// response could not be parsed
    #[error("LLM generation failed: {0}")]
    LlmGeneration(String),

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    /// Chart/table payload with the wrong shape for its placeholder type.
    /// The renderer logs and skips the placeholder.
    #[error("Malformed payload for '{token}': {message}")]
    Payload { token: String, message: String },

    #[error("SlideSpec error: {0}")]
    SlideSpec(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<LlmError> for DeckError {
    fn from(err: LlmError) -> Self {
        DeckError::Llm(err)
    }
}

impl DeckError {
    /// Whether this error aborts a generation request.
    ///
    /// LLM failures are recovered through fallback fill; payload errors skip
    /// a single placeholder.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            DeckError::Llm(_) | DeckError::LlmGeneration(_) | DeckError::Payload { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DeckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_rate_limit() {
        let err = ErrorClassifier::classify("429 Too Many Requests");
        assert_eq!(err.category, ErrorCategory::RateLimit);
        assert!(err.is_retryable());
        assert!(err.category.uses_backoff());
    }

    #[test]
    fn test_classify_connection() {
        let err = ErrorClassifier::classify("connection refused");
        assert_eq!(err.category, ErrorCategory::Network);
        assert!(err.is_retryable());
        assert!(!err.category.uses_backoff());
    }

    #[test]
    fn test_classify_auth_not_retryable() {
        let err = ErrorClassifier::classify("401 Unauthorized: invalid api key");
        assert_eq!(err.category, ErrorCategory::Auth);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_classify_http_status() {
        assert_eq!(
            ErrorClassifier::classify_http_status(429, "slow down").category,
            ErrorCategory::RateLimit
        );
        assert_eq!(
            ErrorClassifier::classify_http_status(503, "unavailable").category,
            ErrorCategory::Unavailable
        );
    }

    #[test]
    fn test_fatality() {
        assert!(DeckError::TemplateNotFound("x".into()).is_fatal());
        assert!(DeckError::InputNotFound("x".into()).is_fatal());
        assert!(!DeckError::LlmGeneration("boom".into()).is_fatal());
        assert!(
            !DeckError::Payload {
                token: "T".into(),
                message: "bad shape".into()
            }
            .is_fatal()
        );
    }
}
