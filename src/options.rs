//! Per-call options for [`crate::engine::ScrapeEngine::scrape`].
//!
//! A plain struct of `Option<T>` fields built with `Default` + struct-update
//! syntax at call sites. Unknown options are rejected "at the boundary" for
//! free: Rust structs have no open/dynamic fields, so there is nothing to
//! validate beyond what the type system already enforces.

use serde::{Deserialize, Serialize};

/// Chooses the formatter (C8) shape of `ScrapeResult::data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    #[default]
    ContentOnly,
    CleanedHtml,
    Markdown,
    FullHtml,
    MetadataOnly,
}

/// Per-call network egress override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub server: String,
}

/// Options accepted by `scrape(url, options?)`. All fields
/// are optional; construct with `ScrapeOptions::default()` and struct-update
/// syntax, e.g. `ScrapeOptions { output_mode: OutputMode::Markdown,..Default::default() }`.
#[derive(Debug, Clone, Default)]
pub struct ScrapeOptions {
    pub output_mode: OutputMode,
    /// Skips model discovery this call; treats the given selector as the
    /// rule. Must pass the same safety
    /// filter as a discovered candidate or the call fails with
    /// `ErrorKind::Configuration` before any page load.
    pub selector_override: Option<String>,
    pub proxy: Option<ProxyConfig>,
    pub user_agent: Option<String>,
    /// Soft upper bound for the entire operation, not just one page load.
    pub timeout_ms: Option<u64>,
    /// Carried through logs/diagnostics only; never interpreted by the engine.
    pub correlation_id: Option<String>,
}
