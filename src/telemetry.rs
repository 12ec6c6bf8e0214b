//! Telemetry metric name constants.
//!
//! Centralised metric names for bifrost operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! These mirror the in-process counters kept by
//! [`MetricsCollector`](crate::collector::MetricsCollector), which back the
//! operator snapshot regardless of whether a recorder is installed.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `bifrost_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `provider`: provider name (e.g. "openai", "gemini")
//! - `status`: "ok" or "error"
//! - `state`: breaker state entered, "open", "half_open", "closed"

/// Total `generate` calls that reached the gateway (cache hits included).
pub const REQUESTS_TOTAL: &str = "bifrost_requests_total";

/// Total requests answered from the response cache.
pub const CACHE_HITS_TOTAL: &str = "bifrost_cache_hits_total";

/// Total requests that missed the response cache.
pub const CACHE_MISSES_TOTAL: &str = "bifrost_cache_misses_total";

/// Total provider invocations.
///
/// Labels: `provider`, `status` ("ok" | "error").
pub const PROVIDER_ATTEMPTS_TOTAL: &str = "bifrost_provider_attempts_total";

/// Provider invocation duration in seconds.
///
/// Labels: `provider`.
pub const PROVIDER_DURATION_SECONDS: &str = "bifrost_provider_duration_seconds";

/// Total breaker state transitions.
///
/// Labels: `provider`, `state`.
pub const BREAKER_TRANSITIONS_TOTAL: &str = "bifrost_breaker_transitions_total";

/// Total requests for which every provider failed or was skipped.
pub const ALL_FAILED_TOTAL: &str = "bifrost_all_failed_total";
