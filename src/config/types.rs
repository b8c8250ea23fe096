//! Engine-wide tuning knobs, distinct from
//! the per-call [`crate::options::ScrapeOptions`].
//!
//! A plain `Default` + `with_*` builder. A typestate builder (making
//! specific fields compile-time mandatory) would be pure ceremony here:
//! `EngineConfig` has no required fields.

use crate::constants::{MIN_CONTENT_CHARS, MIN_SCORE_THRESHOLD, REDISCOVER_N};
use std::time::Duration;

/// Engine-wide configuration, constructed once at `ScrapeEngine::new` and
/// shared across every `scrape()` call.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum concurrently in-flight scrapes.
    pub max_in_flight: usize,
    /// Maximum queued-but-not-yet-admitted submissions.
    pub max_queue_len: usize,
    /// Consecutive failures before a known rule is abandoned for
    /// rediscovery.
    pub rediscover_threshold: u32,
    /// Minimum `score()` for a validated candidate to be accepted.
    pub min_score_threshold: f32,
    /// Minimum extracted text length for a candidate to be accepted.
    pub min_content_chars: usize,
    /// Soft upper bound applied when a call doesn't set
    /// `ScrapeOptions::timeout_ms`.
    pub default_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 1,
            max_queue_len: 100,
            rediscover_threshold: REDISCOVER_N,
            min_score_threshold: MIN_SCORE_THRESHOLD,
            min_content_chars: MIN_CONTENT_CHARS,
            default_timeout: Duration::from_secs(60),
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn with_max_in_flight(mut self, value: usize) -> Self {
        self.max_in_flight = value.max(1);
        self
    }

    #[must_use]
    pub fn with_max_queue_len(mut self, value: usize) -> Self {
        self.max_queue_len = value;
        self
    }

    #[must_use]
    pub fn with_rediscover_threshold(mut self, value: u32) -> Self {
        self.rediscover_threshold = value;
        self
    }

    #[must_use]
    pub fn with_min_score_threshold(mut self, value: f32) -> Self {
        self.min_score_threshold = value.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn with_min_content_chars(mut self, value: usize) -> Self {
        self.min_content_chars = value;
        self
    }

    #[must_use]
    pub fn with_default_timeout(mut self, value: Duration) -> Self {
        self.default_timeout = value;
        self
    }
}
