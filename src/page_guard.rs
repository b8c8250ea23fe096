//! RAII scope guard for a loaded page handle.
//!
//! An `Option<T>`-take `Drop` impl that releases the resource exactly once.
//! `close_page` is async, which `Drop` cannot await directly, so the
//! fast path is an explicit [`PageGuard::close`] on every normal exit; `Drop`
//! is only the safety net for a path that forgot to call it (a cancelled
//! future dropped mid-poll, a panic unwinding through the pipeline).

use crate::ports::browser::{BrowserPort, PageId};
use std::sync::Arc;

pub struct PageGuard<B: BrowserPort + 'static> {
    browser: Arc<B>,
    page: Option<PageId>,
}

impl<B: BrowserPort + 'static> PageGuard<B> {
    #[must_use]
    pub fn new(browser: Arc<B>, page: PageId) -> Self {
        Self {
            browser,
            page: Some(page),
        }
    }

    /// Panics if called after [`Self::close`] has consumed the guard — that
    /// can't happen since `close` takes `self` by value.
    #[must_use]
    pub fn page(&self) -> &PageId {
        self.page.as_ref().expect("page guard invariant: page set until close")
    }

    /// Explicit release on the normal exit path. Disarms the `Drop` safety
    /// net (it sees `page: None` and does nothing).
    pub async fn close(mut self) {
        if let Some(page) = self.page.take() {
            if let Err(err) = self.browser.close_page(&page).await {
                tracing::warn!(error = %err, page_id = %page.0, "failed to close page");
            }
        }
    }
}

impl<B: BrowserPort + 'static> Drop for PageGuard<B> {
    fn drop(&mut self) {
        if let Some(page) = self.page.take() {
            let browser = Arc::clone(&self.browser);
            tracing::warn!(page_id = %page.0, "page guard dropped without explicit close, closing in background");
            tokio::spawn(async move {
                if let Err(err) = browser.close_page(&page).await {
                    tracing::warn!(error = %err, page_id = %page.0, "failed to close page during drop cleanup");
                }
            });
        }
    }
}
