//! Per-request cancellation.
//!
//! A thin wrapper around `tokio::sync::watch` rather than a `tokio-util`
//! `CancellationToken`: nothing in this crate needs `tokio-util` beyond
//! this one primitive, so it's built directly on `tokio::sync::watch`.

use tokio::sync::watch;

/// Handed to a caller at submission time; tripping it cancels the request.
#[derive(Debug, Clone)]
pub struct CancellationSource(watch::Sender<bool>);

/// Checked by the pipeline at each suspension point.
#[derive(Debug, Clone)]
pub struct CancellationToken(watch::Receiver<bool>);

/// Builds a linked source/token pair, not yet cancelled.
#[must_use]
pub fn cancellation_pair() -> (CancellationSource, CancellationToken) {
    let (tx, rx) = watch::channel(false);
    (CancellationSource(tx), CancellationToken(rx))
}

impl CancellationSource {
    /// Trips the token. Idempotent.
    pub fn cancel(&self) {
        let _ = self.0.send(true);
    }
}

impl CancellationToken {
    /// A token that never cancels, for callers that don't need one.
    #[must_use]
    pub fn none() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self(rx)
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once the token is tripped. Used in `tokio::select!` at
    /// pipeline suspension points and in the request queue's wait loop.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.0.borrow() {
                return;
            }
            if self.0.changed().await.is_err() {
                // Source dropped without cancelling; treat as "never".
                std::future::pending::<()>().await;
            }
        }
    }
}
