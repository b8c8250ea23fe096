//! Language-model port.

use async_trait::async_trait;

#[derive(Debug, Clone, Default)]
pub struct SuggestRequest {
    pub simplified_dom: String,
    pub snippets: Vec<String>,
    pub url: String,
    pub previous_failure_reason: Option<String>,
}

/// Suggests candidate selectors for the given page summary.
///
/// Returns the model's raw free-form reply; [`crate::xpath_parser`] (C3) is
/// responsible for tolerantly extracting candidate XPaths from it. A
/// zero-candidate parse (including an empty reply) is treated by the
/// pipeline as a model failure — the port itself is never asked to parse.
#[async_trait]
pub trait ModelPort: Send + Sync {
    async fn suggest(&self, request: SuggestRequest) -> anyhow::Result<String>;
}
