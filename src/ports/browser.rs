//! Browser port: the only way the pipeline touches a page.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Opaque handle to a loaded page. The engine never interprets this value;
/// it only carries it between port calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaitUntil {
    Load,
    DomContentLoaded,
    NetworkIdle,
}

#[derive(Debug, Clone, Default)]
pub struct LoadPageOptions {
    pub proxy: Option<String>,
    pub user_agent: Option<String>,
    pub timeout: Option<Duration>,
    pub wait_until: Option<WaitUntil>,
    /// Carries `SiteConfig.headers` through to the browser port, which has
    /// no other slot for per-request headers; the port contract is this
    /// crate's to shape, so headers get a slot here.
    pub headers: Option<HashMap<String, String>>,
}

/// Challenge kind reported by [`BrowserPort::detect_challenge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengeKind {
    None,
    Generic,
    Sliding,
    Turnstile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedChallenge {
    pub kind: ChallengeKind,
    pub captcha_url: Option<String>,
    pub site_key: Option<String>,
}

impl DetectedChallenge {
    #[must_use]
    pub fn none() -> Self {
        Self {
            kind: ChallengeKind::None,
            captcha_url: None,
            site_key: None,
        }
    }
}

/// Per-candidate metrics used by the scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDetails {
    pub xpath: String,
    pub text_length: usize,
    pub link_density: f32,
    pub paragraph_count: u32,
    pub heading_count: u32,
    pub has_media: bool,
    pub dom_depth: u32,
    /// 1 iff the matched element's tag is one of `article`, `main`, `section`.
    pub semantic_score: u8,
    /// 1 iff the matched element's tag is one of `nav`, `aside`, `footer`, `header`.
    pub unwanted_tag_score: u8,
}

/// Capability set for driving a headless/controlled browser.
///
/// All operations are keyed by the opaque [`PageId`] returned from
/// [`load_page`](BrowserPort::load_page).
#[async_trait]
pub trait BrowserPort: Send + Sync {
    async fn load_page(&self, url: &str, options: LoadPageOptions) -> anyhow::Result<PageId>;

    /// Evaluates `xpath` against the page. Returns `None` if the selector
    /// matched nothing; the port itself enforces the safety filter before
    /// ever touching the DOM.
    async fn evaluate_selector(
        &self,
        page: &PageId,
        xpath: &str,
    ) -> anyhow::Result<Option<Vec<String>>>;

    async fn get_page_html(&self, page: &PageId) -> anyhow::Result<String>;

    async fn detect_challenge(&self, page: &PageId) -> anyhow::Result<DetectedChallenge>;

    async fn get_element_details(
        &self,
        page: &PageId,
        xpath: &str,
    ) -> anyhow::Result<Option<ElementDetails>>;

    async fn get_cookies(&self, page: &PageId) -> anyhow::Result<String>;

    async fn set_cookies(&self, page: &PageId, cookie: &str) -> anyhow::Result<()>;

    async fn reload(&self, page: &PageId, timeout: Option<Duration>) -> anyhow::Result<()>;

    async fn close_page(&self, page: &PageId) -> anyhow::Result<()>;
}
