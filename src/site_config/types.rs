//! `SiteConfig` and its companion types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a `SiteConfig`'s selector was last validated.
///
/// Future callers may prefer `DirectRender` sites when choosing a cheaper
/// fetch path, but the pipeline itself does not currently branch on this:
/// there is no HTTP-only fast path ahead of the browser port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    DirectRender,
    RenderPlusChallenge,
}

/// Learned extraction rule for one normalized domain.
///
/// One record per domain; `domain` is the lookup key used by
/// [`super::store::FileSiteConfigStore`] and must already be normalized
/// (see [`super::domain::normalize_domain`]) before construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub domain: String,
    pub selector: String,
    pub method: ExtractionMethod,
    pub last_success_ts: Option<DateTime<Utc>>,
    pub failures_since_success: u32,
    pub discovered_by_model: bool,
    pub headers: Option<HashMap<String, String>>,
    pub user_agent_override: Option<String>,
    pub cleanup_classes: Option<Vec<String>>,
    pub needs_challenge_solver: Option<bool>,
}

impl SiteConfig {
    /// Builds a fresh record as the engine would upon first successful
    /// discovery: zero failures, success timestamp set to now.
    #[must_use]
    pub fn new_discovered(domain: String, selector: String, method: ExtractionMethod) -> Self {
        Self {
            domain,
            selector,
            method,
            last_success_ts: Some(Utc::now()),
            failures_since_success: 0,
            discovered_by_model: true,
            headers: None,
            user_agent_override: None,
            cleanup_classes: None,
            needs_challenge_solver: None,
        }
    }
}
