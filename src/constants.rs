//! Fixed algorithm constants shared by the scorer, validator, and pipeline.
//!
//! These are properties of the extraction algorithm itself, not
//! per-deployment knobs — see [`crate::config::EngineConfig`] for the
//! things callers are meant to tune.

/// Minimum extracted text length for a candidate to be considered content.
pub const MIN_CONTENT_CHARS: usize = 200;

/// Minimum [`crate::scorer::score`] for a candidate to be accepted.
pub const MIN_SCORE_THRESHOLD: f32 = 0.7;

/// Consecutive failures after which a known rule is abandoned for rediscovery.
pub const REDISCOVER_N: u32 = 2;

/// Maximum accepted length of a candidate selector before it is rejected
/// without ever reaching the browser port.
pub const MAX_SELECTOR_LEN: usize = 500;

/// Characters outside this set cause a candidate selector to be rejected.
pub const SELECTOR_SAFE_CHARS: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_-./[]()@='\" *:,!|";

/// DOM simplifier input is bounded before any regex pass is attempted.
pub const DOM_MAX_INPUT_BYTES: usize = 1024 * 1024;

/// DOM simplifier truncates its output past this many characters.
pub const DOM_MAX_OUTPUT_CHARS: usize = 8_000;

/// Text nodes longer than this are truncated to an ellipsis during simplification.
pub const DOM_TEXT_NODE_MAX_CHARS: usize = 50;

/// Default number of snippets returned by the snippet picker.
pub const SNIPPET_DEFAULT_MAX_SNIPPETS: usize = 3;

/// Default max characters per snippet.
pub const SNIPPET_DEFAULT_MAX_CHARS: usize = 150;

/// Minimum visible text length for a `<p>` to be considered as a snippet source.
pub const SNIPPET_MIN_PARAGRAPH_CHARS: usize = 100;

/// Window (in characters) scanned immediately before a paragraph for blocked classes.
pub const SNIPPET_BLOCKLIST_WINDOW_CHARS: usize = 200;

/// CSS class tokens whose presence marks an element as non-content.
pub const BLOCKED_CLASS_TOKENS: &[&str] = &[
    "ad",
    "advertisement",
    "social-share",
    "related-posts",
    "sidebar",
    "menu",
    "nav",
    "comment",
];
