//! Challenge-solver port.

use super::browser::{ChallengeKind, PageId};
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct SolveRequest {
    pub page: PageId,
    pub kind: ChallengeKind,
    pub page_url: String,
    pub captcha_url: Option<String>,
    pub site_key: Option<String>,
    pub proxy: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SolveOutcome {
    pub solved: bool,
    pub updated_cookie: Option<String>,
    pub token: Option<String>,
    pub reason: Option<String>,
}

#[async_trait]
pub trait ChallengePort: Send + Sync {
    async fn solve(&self, request: SolveRequest) -> anyhow::Result<SolveOutcome>;
}
