use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use podcache_core::{Clock, InventoryItem, InventorySource, Snapshot, SourceError, SystemClock};
use serde::Serialize;

use super::entry::{CachedSnapshot, UserCacheEntry};
use crate::config::AppConfig;
use crate::metrics;

/// Tunables for [`UserCacheStore`].
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub ttl: Duration,
    /// Deadline for one upstream call. `None` waits indefinitely.
    pub upstream_timeout: Option<Duration>,
    pub coalesce_refreshes: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            upstream_timeout: None,
            coalesce_refreshes: false,
        }
    }
}

impl CacheSettings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            ttl: cfg.cache.ttl(),
            upstream_timeout: cfg.upstream.timeout(),
            coalesce_refreshes: cfg.cache.coalesce_refreshes,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = Some(timeout);
        self
    }

    pub fn with_coalescing(mut self, enabled: bool) -> Self {
        self.coalesce_refreshes = enabled;
        self
    }
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of user entries in the table.
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    /// Upstream refreshes performed, successful or not.
    pub refreshes: u64,
    /// Reads that waited on another caller's refresh instead of issuing one.
    pub coalesced: u64,
    pub upstream_failures: u64,
}

impl CacheStats {
    /// Calculate hit rate as a percentage.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Per-user snapshot cache.
///
/// Constructed once at startup and shared through `AppState`. Each user id
/// gets its own entry on first access; the entry is refreshed from the
/// upstream source whenever it is older than the TTL.
pub struct UserCacheStore {
    entries: DashMap<String, Arc<UserCacheEntry>>,
    source: Arc<dyn InventorySource>,
    clock: Arc<dyn Clock>,
    settings: CacheSettings,
    hits: AtomicU64,
    misses: AtomicU64,
    refreshes: AtomicU64,
    coalesced: AtomicU64,
    upstream_failures: AtomicU64,
}

impl UserCacheStore {
    pub fn new(source: Arc<dyn InventorySource>, settings: CacheSettings) -> Self {
        Self {
            entries: DashMap::new(),
            source,
            clock: Arc::new(SystemClock),
            settings,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            refreshes: AtomicU64::new(0),
            coalesced: AtomicU64::new(0),
            upstream_failures: AtomicU64::new(0),
        }
    }

    /// Replace the wall clock used for staleness checks.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Return the user's snapshot, refreshing it from upstream first if it is
    /// missing or stale.
    ///
    /// Never fails: an upstream error is stored and returned as an empty
    /// snapshot.
    pub async fn get_or_refresh(&self, user_id: &str) -> Arc<CachedSnapshot> {
        let entry = self.entry_for(user_id);

        if let Some(cached) = entry.fresh(self.clock.now(), self.settings.ttl) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            metrics::record_cache_hit();
            return cached;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        metrics::record_cache_miss();

        if !self.settings.coalesce_refreshes {
            return self.refresh(user_id, &entry).await;
        }

        let _guard = entry.refresh.lock().await;
        // Whoever held the lock before us may have refreshed already.
        if let Some(cached) = entry.fresh(self.clock.now(), self.settings.ttl) {
            self.coalesced.fetch_add(1, Ordering::Relaxed);
            metrics::record_cache_coalesced();
            return cached;
        }
        self.refresh(user_id, &entry).await
    }

    /// Current snapshot for a user without refreshing or creating an entry.
    pub fn peek(&self, user_id: &str) -> Option<Arc<CachedSnapshot>> {
        self.entries.get(user_id).and_then(|entry| entry.current())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            refreshes: self.refreshes.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            upstream_failures: self.upstream_failures.load(Ordering::Relaxed),
        }
    }

    fn entry_for(&self, user_id: &str) -> Arc<UserCacheEntry> {
        if let Some(existing) = self.entries.get(user_id) {
            return Arc::clone(existing.value());
        }

        let entry = Arc::clone(self.entries.entry(user_id.to_owned()).or_default().value());
        metrics::set_cache_entries(self.entries.len());
        entry
    }

    async fn refresh(&self, user_id: &str, entry: &UserCacheEntry) -> Arc<CachedSnapshot> {
        let fetched_at = self.clock.now();
        let started = Instant::now();

        let snapshot = match self.fetch_upstream().await {
            Ok(items) => Snapshot::from(items),
            Err(e) => {
                self.upstream_failures.fetch_add(1, Ordering::Relaxed);
                metrics::record_upstream_failure();
                tracing::warn!(
                    user_id,
                    error = %e,
                    transient = e.is_transient(),
                    "Upstream fetch failed, caching empty snapshot"
                );
                Snapshot::empty()
            }
        };

        let elapsed = started.elapsed();
        self.refreshes.fetch_add(1, Ordering::Relaxed);
        metrics::record_cache_refresh(elapsed);
        tracing::debug!(
            user_id,
            items = snapshot.len(),
            elapsed_ms = %elapsed.as_millis(),
            "User cache refreshed"
        );

        let cached = Arc::new(CachedSnapshot::new(snapshot, fetched_at));
        entry.publish(Arc::clone(&cached));
        cached
    }

    async fn fetch_upstream(&self) -> Result<Vec<InventoryItem>, SourceError> {
        match self.settings.upstream_timeout {
            Some(limit) => tokio::time::timeout(limit, self.source.fetch_all())
                .await
                .map_err(|_| SourceError::Timeout(limit))?,
            None => self.source.fetch_all().await,
        }
    }
}
