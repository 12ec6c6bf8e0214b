//! Cache-then-failover request execution.

use std::time::Instant;

use tracing::{debug, error, info, instrument, warn};

use crate::cache::{CacheKey, ResponseCache};
use crate::collector::MetricsCollector;
use crate::error::{AllProvidersFailed, ProviderError, ProviderFailure};
use crate::providers::{ProviderRegistry, RegisteredProvider};
use crate::types::{AttemptRecord, GenerateRequest};

/// Runs one request: cache lookup, then providers in priority order until
/// one answers.
///
/// Providers whose breaker refuses admission are skipped without being
/// invoked. Every attempted provider's failure is kept, in attempt order,
/// and returned together if nobody answers.
#[derive(Debug)]
pub struct FailoverExecutor {
    registry: ProviderRegistry,
    cache: ResponseCache,
    collector: MetricsCollector,
}

impl FailoverExecutor {
    pub fn new(registry: ProviderRegistry, cache: ResponseCache) -> Self {
        Self {
            registry,
            cache,
            collector: MetricsCollector::new(),
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn collector(&self) -> &MetricsCollector {
        &self.collector
    }

    /// Execute a request that has already passed validation.
    ///
    /// Dropping the returned future mid-attempt leaves the current
    /// provider's breaker untouched: a cancelled call is neither a success
    /// nor a failure.
    #[instrument(skip_all, fields(model = request.model.as_deref().unwrap_or("default")))]
    pub async fn execute(&self, request: &GenerateRequest) -> Result<String, AllProvidersFailed> {
        self.collector.record_request();

        let key = (!request.no_cache).then(|| {
            CacheKey::new(
                request.model.as_deref(),
                &request.system_prompt,
                &request.user_prompt,
                request.temperature,
            )
        });

        if let Some(key) = &key {
            if let Some(hit) = self.cache.lookup(key) {
                self.collector.record_cache_hit();
                debug!(key = key.value(), "cache hit");
                return Ok(hit.to_string());
            }
            self.collector.record_cache_miss();
            debug!(key = key.value(), "cache miss");
        }

        let mut outcome = AllProvidersFailed::default();
        for entry in self.registry.ordered() {
            let Some(permit) = entry.breaker().acquire() else {
                warn!(provider = entry.name(), "circuit open, skipping provider");
                outcome.skipped.push(entry.name().to_string());
                continue;
            };

            let start = Instant::now();
            let result = self.attempt(entry, request).await;
            let latency = start.elapsed();

            self.collector.record_attempt(&AttemptRecord {
                provider: entry.name().to_string(),
                latency,
                error: result.as_ref().err().cloned(),
            });

            match result {
                Ok(text) => {
                    permit.succeed();
                    if let Some(key) = key {
                        let ttl = request.ttl.unwrap_or_else(|| self.cache.default_ttl());
                        self.cache.store(key, &text, ttl);
                    }
                    info!(
                        provider = entry.name(),
                        latency_ms = latency.as_millis() as u64,
                        "request served"
                    );
                    return Ok(text);
                }
                Err(failure) => {
                    permit.fail();
                    if failure.is_transient() {
                        warn!(provider = entry.name(), error = %failure, "provider failed, trying next");
                    } else {
                        error!(
                            provider = entry.name(),
                            error = %failure,
                            "provider misconfigured, trying next"
                        );
                    }
                    outcome
                        .failures
                        .push(ProviderError::new(entry.name(), failure));
                }
            }
        }

        self.collector.record_all_failed();
        error!(
            attempted = outcome.failures.len(),
            skipped = outcome.skipped.len(),
            "all providers failed"
        );
        Err(outcome)
    }

    /// One invocation bounded by the provider's timeout.
    async fn attempt(
        &self,
        entry: &RegisteredProvider,
        request: &GenerateRequest,
    ) -> Result<String, ProviderFailure> {
        let timeout = entry.config().timeout;
        let call = entry.provider().invoke(
            &request.system_prompt,
            &request.user_prompt,
            request.model.as_deref(),
            request.temperature,
        );
        match tokio::time::timeout(timeout, call).await {
            Ok(Ok(text)) if text.trim().is_empty() => Err(ProviderFailure::EmptyResponse),
            Ok(Ok(text)) => Ok(text),
            Ok(Err(err)) => Err(err.failure),
            Err(_) => Err(ProviderFailure::Timeout(timeout)),
        }
    }
}
