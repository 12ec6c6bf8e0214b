//! In-process request counters and the operator snapshot.
//!
//! Counters are cumulative for the life of the process and reset only on
//! restart. Every increment is mirrored to the `metrics` facade (see
//! [`telemetry`](crate::telemetry)) so a host can export them as well.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::providers::ProviderRegistry;
use crate::telemetry;
use crate::types::AttemptRecord;

/// Read-only view of the gateway counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub cache_hits: u64,
    /// `100 * cache_hits / total_requests`, rounded to two decimals; 0 with no requests.
    pub cache_hit_rate_percent: f64,
    /// Individual provider failures.
    pub failures: u64,
    /// Providers whose breaker is not OPEN.
    pub providers_active: usize,
}

/// Atomic counters shared by every in-flight request.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    total_requests: AtomicU64,
    cache_hits: AtomicU64,
    failures: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::SeqCst);
        metrics::counter!(telemetry::REQUESTS_TOTAL).increment(1);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::SeqCst);
        metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
    }

    pub fn record_cache_miss(&self) {
        metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
    }

    /// Record one provider invocation; failed attempts bump `failures`.
    pub fn record_attempt(&self, attempt: &AttemptRecord) {
        let status = if attempt.succeeded() { "ok" } else { "error" };
        metrics::counter!(telemetry::PROVIDER_ATTEMPTS_TOTAL,
            "provider" => attempt.provider.clone(),
            "status" => status,
        )
        .increment(1);
        metrics::histogram!(telemetry::PROVIDER_DURATION_SECONDS,
            "provider" => attempt.provider.clone(),
        )
        .record(attempt.latency.as_secs_f64());

        if !attempt.succeeded() {
            self.failures.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn record_all_failed(&self) {
        metrics::counter!(telemetry::ALL_FAILED_TOTAL).increment(1);
    }

    /// Snapshot the counters, asking each breaker in `registry` whether it admits.
    pub fn snapshot(&self, registry: &ProviderRegistry) -> MetricsSnapshot {
        // Hits are loaded before the total so the snapshot never shows more
        // hits than requests.
        let cache_hits = self.cache_hits.load(Ordering::SeqCst);
        let total_requests = self.total_requests.load(Ordering::SeqCst);
        let failures = self.failures.load(Ordering::SeqCst);

        MetricsSnapshot {
            total_requests,
            cache_hits,
            cache_hit_rate_percent: hit_rate_percent(cache_hits, total_requests),
            failures,
            providers_active: registry.active_count(),
        }
    }
}

fn hit_rate_percent(hits: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let rate = hits as f64 * 100.0 / total as f64;
    (rate * 100.0).round() / 100.0
}
