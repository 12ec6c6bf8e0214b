//! The gateway facade and its request pipeline.

mod builder;
mod executor;

pub use builder::{Bifrost, BifrostBuilder};
pub use executor::FailoverExecutor;

use std::sync::Arc;

use async_trait::async_trait;

use crate::breaker::BreakerSnapshot;
use crate::collector::MetricsSnapshot;
use crate::providers::ProviderRegistry;
use crate::traits::TextGenerator;
use crate::types::GenerateRequest;
use crate::Result;

/// Single entry point for text generation.
///
/// Cloning is cheap: clones share the same cache, breakers and counters.
/// Construct one per process with [`Bifrost::builder`] and hand it to every
/// caller.
#[derive(Debug, Clone)]
pub struct LlmGateway {
    executor: Arc<FailoverExecutor>,
}

/// Breaker view of one provider, for operators.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderStatus {
    pub name: String,
    pub priority: i32,
    pub breaker: BreakerSnapshot,
}

impl LlmGateway {
    pub(crate) fn new(executor: FailoverExecutor) -> Self {
        Self {
            executor: Arc::new(executor),
        }
    }

    /// Generate text, caching the answer for the default TTL.
    ///
    /// `model` overrides each provider's configured default.
    pub async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
        model: Option<&str>,
    ) -> Result<String> {
        let mut request = GenerateRequest::new(system_prompt, user_prompt).temperature(temperature);
        request.model = model.map(str::to_owned);
        self.generate_request(&request).await
    }

    /// Generate text with per-request cache control.
    pub async fn generate_request(&self, request: &GenerateRequest) -> Result<String> {
        request.validate()?;
        Ok(self.executor.execute(request).await?)
    }

    /// Current counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.executor.collector().snapshot(self.executor.registry())
    }

    /// Breaker state of every provider, in attempt order.
    pub fn provider_status(&self) -> Vec<ProviderStatus> {
        self.executor
            .registry()
            .ordered()
            .iter()
            .map(|entry| ProviderStatus {
                name: entry.name().to_string(),
                priority: entry.config().priority,
                breaker: entry.breaker().snapshot(),
            })
            .collect()
    }

    /// Drop every cached response.
    pub fn clear_cache(&self) {
        self.executor.cache().clear();
    }

    pub fn registry(&self) -> &ProviderRegistry {
        self.executor.registry()
    }
}

#[async_trait]
impl TextGenerator for LlmGateway {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
        model: Option<&str>,
    ) -> Result<String> {
        LlmGateway::generate(self, system_prompt, user_prompt, temperature, model).await
    }
}
