//! File-backed [`StorePort`] implementation (C1).
//!
//! One JSON document holds the full collection, rewritten atomically
//! (write temp file, `sync_all`, rename) on every mutation. Writes are
//! serialized through a single-slot `tokio::sync::Mutex`; reads are served
//! from a `DashMap` cache that is only refreshed after a write's rename has
//! completed, so reads never block on or observe a partial write.

use super::types::SiteConfig;
use crate::ports::store::StorePort;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Persists learned [`SiteConfig`] records as a single JSON document.
pub struct FileSiteConfigStore {
    path: PathBuf,
    cache: DashMap<String, SiteConfig>,
    write_lock: Mutex<()>,
}

impl FileSiteConfigStore {
    /// Opens (without yet reading) the store backed by `path`. Call
    /// [`Self::load`] once before use to populate the cache from disk.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: DashMap::new(),
            write_lock: Mutex::new(()),
        }
    }

    /// Populates the in-memory cache from the on-disk document, creating an
    /// empty document if none exists yet.
    pub async fn load(&self) -> anyhow::Result<()> {
        if !self.path.exists() {
            self.persist(&HashMap::new()).await?;
            return Ok(());
        }

        let contents = fs::read_to_string(&self.path).await?;
        let records: HashMap<String, SiteConfig> = if contents.trim().is_empty() {
            HashMap::new()
        } else {
            serde_json::from_str(&contents)?
        };

        self.cache.clear();
        for (domain, cfg) in records {
            self.cache.insert(domain, cfg);
        }
        Ok(())
    }

    fn snapshot(&self) -> HashMap<String, SiteConfig> {
        self.cache
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Atomically rewrites the whole document. Caller must hold `write_lock`.
    async fn persist(&self, records: &HashMap<String, SiteConfig>) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string_pretty(records)?;
        let temp_path = temp_path_for(&self.path);

        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(json.as_bytes()).await?;
        file.sync_all().await?;
        fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "site_config".to_string());
    name.push_str(".tmp");
    path.with_file_name(name)
}

#[async_trait]
impl StorePort for FileSiteConfigStore {
    async fn get(&self, domain: &str) -> anyhow::Result<Option<SiteConfig>> {
        Ok(self.cache.get(domain).map(|entry| entry.value().clone()))
    }

    async fn save(&self, config: SiteConfig) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.snapshot();
        records.insert(config.domain.clone(), config.clone());
        self.persist(&records).await?;
        self.cache.insert(config.domain.clone(), config);
        Ok(())
    }

    async fn increment_failure(&self, domain: &str) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.snapshot();
        let Some(cfg) = records.get_mut(domain) else {
            return Ok(());
        };
        cfg.failures_since_success += 1;
        self.persist(&records).await?;
        if let Some(updated) = records.remove(domain) {
            self.cache.insert(domain.to_string(), updated);
        }
        Ok(())
    }

    async fn mark_success(&self, domain: &str) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.snapshot();
        let Some(cfg) = records.get_mut(domain) else {
            return Ok(());
        };
        cfg.failures_since_success = 0;
        cfg.last_success_ts = Some(Utc::now());
        self.persist(&records).await?;
        if let Some(updated) = records.remove(domain) {
            self.cache.insert(domain.to_string(), updated);
        }
        Ok(())
    }

    async fn delete(&self, domain: &str) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.snapshot();
        if records.remove(domain).is_none() {
            return Ok(());
        }
        self.persist(&records).await?;
        self.cache.remove(domain);
        Ok(())
    }

    async fn get_all(&self) -> anyhow::Result<Vec<SiteConfig>> {
        Ok(self.cache.iter().map(|entry| entry.value().clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site_config::types::ExtractionMethod;

    #[tokio::test]
    async fn save_then_get_round_trips() {
        let dir = std::env::temp_dir().join(format!(
            "scrapecraft-test-{}",
            std::process::id()
        ));
        let path = dir.join("site_config.json");
        let store = FileSiteConfigStore::new(&path);
        store.load().await.unwrap();

        let cfg = SiteConfig::new_discovered(
            "example.com".to_string(),
            "//article".to_string(),
            ExtractionMethod::DirectRender,
        );
        store.save(cfg.clone()).await.unwrap();

        let fetched = store.get("example.com").await.unwrap().unwrap();
        assert_eq!(fetched.selector, "//article");

        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn increment_failure_is_noop_when_missing() {
        let dir = std::env::temp_dir().join(format!(
            "scrapecraft-test-missing-{}",
            std::process::id()
        ));
        let path = dir.join("site_config.json");
        let store = FileSiteConfigStore::new(&path);
        store.load().await.unwrap();

        store.increment_failure("nowhere.example").await.unwrap();
        assert!(store.get("nowhere.example").await.unwrap().is_none());

        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn mark_success_resets_failures() {
        let dir = std::env::temp_dir().join(format!(
            "scrapecraft-test-success-{}",
            std::process::id()
        ));
        let path = dir.join("site_config.json");
        let store = FileSiteConfigStore::new(&path);
        store.load().await.unwrap();

        let mut cfg = SiteConfig::new_discovered(
            "example.com".to_string(),
            "//article".to_string(),
            ExtractionMethod::DirectRender,
        );
        cfg.failures_since_success = 2;
        store.save(cfg).await.unwrap();

        store.mark_success("example.com").await.unwrap();
        let fetched = store.get("example.com").await.unwrap().unwrap();
        assert_eq!(fetched.failures_since_success, 0);
        assert!(fetched.last_success_ts.is_some());

        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn delete_removes_record_and_is_noop_when_absent() {
        let dir = std::env::temp_dir().join(format!(
            "scrapecraft-test-delete-{}",
            std::process::id()
        ));
        let path = dir.join("site_config.json");
        let store = FileSiteConfigStore::new(&path);
        store.load().await.unwrap();

        store.delete("nowhere.example").await.unwrap();

        let cfg = SiteConfig::new_discovered(
            "example.com".to_string(),
            "//article".to_string(),
            ExtractionMethod::DirectRender,
        );
        store.save(cfg).await.unwrap();
        assert!(store.get("example.com").await.unwrap().is_some());

        store.delete("example.com").await.unwrap();
        assert!(store.get("example.com").await.unwrap().is_none());

        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn get_all_returns_every_saved_record() {
        let dir = std::env::temp_dir().join(format!(
            "scrapecraft-test-getall-{}",
            std::process::id()
        ));
        let path = dir.join("site_config.json");
        let store = FileSiteConfigStore::new(&path);
        store.load().await.unwrap();

        store
            .save(SiteConfig::new_discovered(
                "a.example".to_string(),
                "//article".to_string(),
                ExtractionMethod::DirectRender,
            ))
            .await
            .unwrap();
        store
            .save(SiteConfig::new_discovered(
                "b.example".to_string(),
                "//main".to_string(),
                ExtractionMethod::RenderPlusChallenge,
            ))
            .await
            .unwrap();

        let mut domains: Vec<String> = store
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|cfg| cfg.domain)
            .collect();
        domains.sort();
        assert_eq!(domains, vec!["a.example".to_string(), "b.example".to_string()]);

        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn reads_are_copies_not_aliased_to_the_cache() {
        let dir = std::env::temp_dir().join(format!(
            "scrapecraft-test-alias-{}",
            std::process::id()
        ));
        let path = dir.join("site_config.json");
        let store = FileSiteConfigStore::new(&path);
        store.load().await.unwrap();

        store
            .save(SiteConfig::new_discovered(
                "example.com".to_string(),
                "//article".to_string(),
                ExtractionMethod::DirectRender,
            ))
            .await
            .unwrap();

        let mut first = store.get("example.com").await.unwrap().unwrap();
        first.selector = "//mutated".to_string();

        let second = store.get("example.com").await.unwrap().unwrap();
        assert_eq!(second.selector, "//article");

        let _ = fs::remove_dir_all(&dir).await;
    }
}
