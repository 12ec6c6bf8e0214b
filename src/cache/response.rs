//! Bounded LRU response cache with per-entry TTL.
//!
//! # Architecture
//!
//! The cache sits in the [`FailoverExecutor`](crate::gateway::FailoverExecutor),
//! above the [`ProviderRegistry`](crate::providers::ProviderRegistry) chain.
//! A hit bypasses breakers and providers entirely.
//!
//! Backed by moka's synchronous cache, which is internally sharded and
//! safe to share across threads. Two requests that both miss and both
//! store the same key simply overwrite each other with equivalent values.
//!
//! # Expiry
//!
//! moka expires entries through the [`Expiry`] hook using each entry's own
//! TTL. Lookups additionally compare against the entry's `expires_at`, so an
//! entry whose deadline has passed is never returned even if moka has not
//! yet run its housekeeping; such entries are evicted on the spot.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::policy::EvictionPolicy;
use moka::sync::Cache;

use super::CacheKey;

/// Longest lifetime an entry may be stored with. Requests and configs asking
/// for more are rejected; [`ResponseCache::store`] clamps to it.
pub const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Configuration for the response cache.
///
/// ```rust
/// # use bifrost::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(10_000)
///     .default_ttl(Duration::from_secs(3600));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Maximum number of cached entries. Default: 1,000.
    pub max_entries: u64,
    /// TTL applied when the caller does not pick one. Default: 1 hour.
    pub default_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1_000,
            default_ttl: Duration::from_secs(3600),
        }
    }
}

impl CacheConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached entries.
    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }

    /// Set the TTL used when a request does not supply its own.
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }
}

/// A cached response and its deadline.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: Arc<str>,
    pub expires_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn new(value: &str, ttl: Duration) -> Self {
        let ttl = ttl.min(MAX_TTL);
        let now = Instant::now();
        Self {
            value: Arc::from(value),
            expires_at: now.checked_add(ttl).unwrap_or(now),
            ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Per-entry expiry: each entry lives for the TTL it was stored with.
/// Reads do not extend the deadline; overwrites restart it.
struct EntryExpiry;

impl Expiry<CacheKey, CacheEntry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &CacheKey,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &CacheKey,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-memory response cache.
///
/// Least-recently-used eviction once `max_entries` is exceeded, so a flood
/// of one-off user prompts cannot push out the hot system-prompt templates
/// that are re-requested constantly.
pub struct ResponseCache {
    cache: Cache<CacheKey, CacheEntry>,
    default_ttl: Duration,
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("entries", &self.cache.entry_count())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

impl ResponseCache {
    /// Create a new response cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .eviction_policy(EvictionPolicy::lru())
            .expire_after(EntryExpiry)
            .build();
        Self {
            cache,
            default_ttl: config.default_ttl,
        }
    }

    /// TTL used by callers that do not pick one.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Look up a cached response.
    ///
    /// Returns `None` on a miss or when the entry's deadline has passed; an
    /// expired entry is evicted here.
    pub fn lookup(&self, key: &CacheKey) -> Option<Arc<str>> {
        let entry = self.cache.get(key)?;
        if entry.is_expired() {
            self.cache.invalidate(key);
            return None;
        }
        Some(entry.value)
    }

    /// Store a response for `ttl`, replacing any existing entry for `key`.
    ///
    /// A zero TTL would be expired on arrival, so it only clears the key.
    /// TTLs above [`MAX_TTL`] are clamped.
    pub fn store(&self, key: CacheKey, value: &str, ttl: Duration) {
        if ttl.is_zero() {
            self.cache.invalidate(&key);
            return;
        }
        self.cache.insert(key, CacheEntry::new(value, ttl));
    }

    /// Drop a single entry.
    pub fn invalidate(&self, key: &CacheKey) {
        self.cache.invalidate(key);
    }

    /// Number of entries currently in the cache.
    ///
    /// Eventually consistent; call [`run_pending_tasks`](Self::run_pending_tasks)
    /// first for an exact figure.
    pub fn len(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict all entries.
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }

    /// Apply pending evictions and expirations now.
    pub fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks();
    }
}
