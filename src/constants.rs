//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// LLM retry policy constants
pub mod retry {
    /// Default maximum attempts per generation call
    pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

    /// Base delay for exponential backoff on rate-limit errors (milliseconds)
    pub const BASE_DELAY_MS: u64 = 1_000;

    /// Fixed delay for connection-class errors (milliseconds)
    pub const CONNECTION_DELAY_MS: u64 = 2_000;

    /// Maximum delay between retries (seconds)
    pub const MAX_DELAY_SECS: u64 = 30;
}

/// Fallback content used when AI generation is disabled or fails.
///
/// Deterministic stand-ins keep every declared placeholder filled so the
/// SlideSpec completeness invariant holds even without an LLM.
pub mod fallback {
    /// Fallback for `bullet_list` placeholders
    pub const BULLET_LIST: &str = "• 内容生成失败\n• 请人工补充";

    /// Fallback for every other AI-generated placeholder type
    pub const TEXT: &str = "（内容生成失败，请人工补充）";
}

/// Data extraction constants
pub mod extract {
    /// Default row cap for native table extraction
    pub const DEFAULT_MAX_ROWS: usize = 10;

    /// Severity keys recognized by the pie-chart display-name table,
    /// paired with their zh-CN display names
    pub const SEVERITY_DISPLAY: [(&str, &str); 5] = [
        ("critical", "严重"),
        ("high", "高危"),
        ("medium", "中危"),
        ("low", "低危"),
        ("info", "信息"),
    ];
}

/// Numeric cross-validation constants
pub mod validation {
    /// Absolute tolerance when comparing rendered numbers against source data
    pub const TOLERANCE: f64 = 0.01;
}

/// Chart/table rendering constants
pub mod render {
    /// Severity-aware palette (RGB), applied when category names match the
    /// severity vocabulary in either raw-key or display-name form
    pub const SEVERITY_COLORS: [(&str, &str, u32); 5] = [
        ("critical", "严重", 0xDC2626),
        ("high", "高危", 0xF97316),
        ("medium", "中危", 0xFACC15),
        ("low", "低危", 0x22C55E),
        ("info", "信息", 0x3B82F6),
    ];

    /// Fixed multi-series palette, assigned in declaration order when
    /// category names carry no severity meaning
    pub const SERIES_COLORS: [u32; 6] = [
        0x1E40AF, 0x3B82F6, 0x22C55E, 0xF97316, 0x8B5CF6, 0x64748B,
    ];

    /// Table header row fill
    pub const TABLE_HEADER_FILL: u32 = 0x1E40AF;

    /// Alternating data-row fill for readability
    pub const TABLE_ALT_ROW_FILL: u32 = 0xF8FAFC;

    /// Default chart position (inches: left, top, width, height) when the
    /// template carries none
    pub const DEFAULT_BAR_CHART_POS: (f32, f32, f32, f32) = (0.5, 1.5, 6.0, 4.5);
    pub const DEFAULT_PIE_CHART_POS: (f32, f32, f32, f32) = (7.0, 1.5, 5.5, 4.5);
    pub const DEFAULT_TABLE_POS: (f32, f32, f32, f32) = (0.5, 1.5, 12.0, 4.5);
}
