use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use podcache_core::{InventoryItem, Snapshot};
use time::OffsetDateTime;

/// A snapshot together with the time its refresh started.
///
/// Never mutated after construction; a refresh swaps in a new value.
#[derive(Debug)]
pub struct CachedSnapshot {
    snapshot: Snapshot,
    fetched_at: OffsetDateTime,
}

impl CachedSnapshot {
    pub fn new(snapshot: Snapshot, fetched_at: OffsetDateTime) -> Self {
        Self {
            snapshot,
            fetched_at,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn items(&self) -> &[InventoryItem] {
        self.snapshot.items()
    }

    pub fn fetched_at(&self) -> OffsetDateTime {
        self.fetched_at
    }

    pub fn age(&self, now: OffsetDateTime) -> time::Duration {
        now - self.fetched_at
    }

    pub fn is_stale(&self, now: OffsetDateTime, ttl: Duration) -> bool {
        self.age(now) >= ttl
    }
}

/// Cache slot for one user.
#[derive(Default)]
pub(crate) struct UserCacheEntry {
    current: ArcSwapOption<CachedSnapshot>,
    /// Held across the upstream call when refreshes are coalesced.
    pub(crate) refresh: tokio::sync::Mutex<()>,
}

impl UserCacheEntry {
    pub(crate) fn current(&self) -> Option<Arc<CachedSnapshot>> {
        self.current.load_full()
    }

    /// The current snapshot if it is still within `ttl`.
    pub(crate) fn fresh(&self, now: OffsetDateTime, ttl: Duration) -> Option<Arc<CachedSnapshot>> {
        self.current().filter(|cached| !cached.is_stale(now, ttl))
    }

    pub(crate) fn publish(&self, cached: Arc<CachedSnapshot>) {
        self.current.store(Some(cached));
    }
}
