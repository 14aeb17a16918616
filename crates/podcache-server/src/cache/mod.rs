//! Per-user snapshot cache in front of the upstream pod inventory.
//!
//! ## Layout
//!
//! - **Table (DashMap)**: user id → entry. Find-or-create is serialized per
//!   shard, so users on different shards never contend.
//! - **Entry (ArcSwap)**: the current `CachedSnapshot` (items plus fetch
//!   time) is published as one immutable value. Readers load it without
//!   locking and can never observe items paired with the wrong timestamp.
//!
//! ## Staleness
//!
//! An entry is stale once `now - fetched_at >= ttl`. A stale or missing entry
//! is refreshed inline by the requesting task. Upstream failures are cached
//! as an empty snapshot until the next expiry.
//!
//! ## Known limits
//!
//! Entries are never evicted, so memory grows with the number of distinct
//! user ids seen. The `cache_entries` gauge tracks it.

pub mod entry;
pub mod store;

pub use entry::CachedSnapshot;
pub use store::{CacheSettings, CacheStats, UserCacheStore};
