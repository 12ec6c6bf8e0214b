//! Tests for [`ResponseCache`]: bounded LRU with per-entry TTL.

use std::sync::Arc;
use std::time::Duration;

use bifrost::cache::{CacheConfig, CacheKey, MAX_TTL, ResponseCache};

fn key(user: &str) -> CacheKey {
    CacheKey::new(None, "You are a tutor.", user, 0.3)
}

// =========================================================================
// CacheConfig
// =========================================================================

#[test]
fn cache_config_defaults() {
    let config = CacheConfig::default();
    assert_eq!(config.max_entries, 1_000);
    assert_eq!(config.default_ttl, Duration::from_secs(3600));
}

#[test]
fn cache_config_builder() {
    let config = CacheConfig::new()
        .max_entries(500)
        .default_ttl(Duration::from_secs(60));
    assert_eq!(config.max_entries, 500);
    assert_eq!(config.default_ttl, Duration::from_secs(60));
}

// =========================================================================
// CacheKey
// =========================================================================

#[test]
fn key_is_deterministic() {
    assert_eq!(key("what is a bond?"), key("what is a bond?"));
    assert_ne!(key("what is a bond?"), key("what is a stock?"));
}

#[test]
fn key_distinguishes_every_component() {
    let base = CacheKey::new(Some("gpt-4o"), "sys", "user", 0.5);
    assert_ne!(base, CacheKey::new(None, "sys", "user", 0.5));
    assert_ne!(base, CacheKey::new(Some("gpt-4"), "sys", "user", 0.5));
    assert_ne!(base, CacheKey::new(Some("gpt-4o"), "sys2", "user", 0.5));
    assert_ne!(base, CacheKey::new(Some("gpt-4o"), "sys", "user2", 0.5));
    assert_ne!(base, CacheKey::new(Some("gpt-4o"), "sys", "user", 0.6));
}

#[test]
fn key_does_not_confuse_prompt_boundaries() {
    assert_ne!(
        CacheKey::new(None, "ab", "c", 0.0),
        CacheKey::new(None, "a", "bc", 0.0)
    );
}

// =========================================================================
// ResponseCache
// =========================================================================

#[test]
fn store_then_lookup() {
    let cache = ResponseCache::new(&CacheConfig::new());
    assert!(cache.lookup(&key("q")).is_none());

    cache.store(key("q"), "answer", Duration::from_secs(60));
    assert_eq!(cache.lookup(&key("q")).as_deref(), Some("answer"));
}

#[test]
fn overwrite_replaces_value() {
    let cache = ResponseCache::new(&CacheConfig::new());
    cache.store(key("q"), "old", Duration::from_secs(60));
    cache.store(key("q"), "new", Duration::from_secs(60));
    assert_eq!(cache.lookup(&key("q")).as_deref(), Some("new"));
}

#[test]
fn per_entry_ttl() {
    let cache = ResponseCache::new(&CacheConfig::new());
    cache.store(key("volatile"), "price", Duration::from_millis(50));
    cache.store(key("stable"), "definition", Duration::from_secs(3600));

    std::thread::sleep(Duration::from_millis(120));

    assert!(cache.lookup(&key("volatile")).is_none());
    assert_eq!(cache.lookup(&key("stable")).as_deref(), Some("definition"));
}

#[test]
fn zero_ttl_is_not_stored() {
    let cache = ResponseCache::new(&CacheConfig::new());
    cache.store(key("q"), "answer", Duration::ZERO);
    assert!(cache.lookup(&key("q")).is_none());
}

#[test]
fn capacity_is_bounded() {
    let cache = ResponseCache::new(&CacheConfig::new().max_entries(10));
    for i in 0..50 {
        cache.store(key(&format!("q{i}")), "answer", Duration::from_secs(60));
    }
    cache.run_pending_tasks();
    assert!(cache.len() <= 10, "cache holds {} entries", cache.len());
}

#[test]
fn eviction_drops_least_recently_used() {
    let cache = ResponseCache::new(&CacheConfig::new().max_entries(3));
    let ttl = Duration::from_secs(60);
    cache.store(key("a"), "A", ttl);
    cache.store(key("b"), "B", ttl);
    cache.store(key("c"), "C", ttl);
    cache.run_pending_tasks();

    assert_eq!(cache.lookup(&key("a")).as_deref(), Some("A"));
    cache.store(key("d"), "D", ttl);
    cache.run_pending_tasks();

    assert_eq!(cache.lookup(&key("a")).as_deref(), Some("A"));
    assert_eq!(cache.lookup(&key("d")).as_deref(), Some("D"));
    assert!(cache.lookup(&key("b")).is_none(), "b was least recently used");
    assert_eq!(cache.len(), 3);
}

#[test]
fn ttl_beyond_maximum_is_clamped() {
    let cache = ResponseCache::new(&CacheConfig::new());
    cache.store(key("q"), "answer", Duration::MAX);
    assert_eq!(cache.lookup(&key("q")).as_deref(), Some("answer"));

    cache.store(key("r"), "answer", MAX_TTL);
    assert_eq!(cache.lookup(&key("r")).as_deref(), Some("answer"));
}

#[test]
fn clear_removes_everything() {
    let cache = ResponseCache::new(&CacheConfig::new());
    cache.store(key("a"), "1", Duration::from_secs(60));
    cache.store(key("b"), "2", Duration::from_secs(60));

    cache.clear();
    cache.run_pending_tasks();

    assert!(cache.lookup(&key("a")).is_none());
    assert!(cache.lookup(&key("b")).is_none());
    assert!(cache.is_empty());
}

#[test]
fn concurrent_writers_leave_consistent_entries() {
    let cache = Arc::new(ResponseCache::new(&CacheConfig::new()));
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                for i in 0..100 {
                    let value = format!("answer {i}");
                    cache.store(key(&format!("q{i}")), &value, Duration::from_secs(60));
                    if let Some(hit) = cache.lookup(&key(&format!("q{}", (i + t) % 100))) {
                        assert!(hit.starts_with("answer "));
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for i in 0..100 {
        assert_eq!(
            cache.lookup(&key(&format!("q{i}"))).as_deref(),
            Some(format!("answer {i}").as_str())
        );
    }
}
