//! Store port (C1).

use crate::site_config::SiteConfig;
use async_trait::async_trait;

/// Persistent per-domain learned-rule store (C1), keyed by normalized domain.
///
/// Implementations must uphold the store's concurrency discipline: writes
/// serialized, reads served from a cache updated only after a successful
/// write, and returned values are always owned copies (never aliased to the
/// cache). [`crate::site_config::FileSiteConfigStore`] is the reference
/// implementation.
#[async_trait]
pub trait StorePort: Send + Sync {
    async fn get(&self, domain: &str) -> anyhow::Result<Option<SiteConfig>>;

    async fn save(&self, config: SiteConfig) -> anyhow::Result<()>;

    /// Adds 1 to `failures_since_success` if a record exists; no-op otherwise.
    async fn increment_failure(&self, domain: &str) -> anyhow::Result<()>;

    /// Sets `failures_since_success = 0` and `last_success_ts = now` if a
    /// record exists; no-op otherwise.
    async fn mark_success(&self, domain: &str) -> anyhow::Result<()>;

    async fn delete(&self, domain: &str) -> anyhow::Result<()>;

    async fn get_all(&self) -> anyhow::Result<Vec<SiteConfig>>;
}
