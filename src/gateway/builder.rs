//! Builder for configuring gateway instances

use std::sync::Arc;

use reqwest::Client;
use tracing::{debug, warn};

use super::{FailoverExecutor, LlmGateway};
use crate::breaker::BreakerConfig;
use crate::cache::{CacheConfig, MAX_TTL, ResponseCache};
use crate::config::GatewayConfig;
use crate::providers::{CompletionProvider, ProviderRegistry, build_provider, http};
use crate::types::ProviderConfig;
use crate::{BifrostError, Result};

/// Main entry point for creating gateway instances.
pub struct Bifrost;

impl Bifrost {
    /// Create a new builder for configuring the gateway.
    pub fn builder() -> BifrostBuilder {
        BifrostBuilder::new()
    }
}

enum Pending {
    /// Adapter chosen from the config's kind at build time.
    Configured(ProviderConfig),
    /// Caller-supplied adapter.
    Custom(ProviderConfig, Arc<dyn CompletionProvider>),
}

/// Builder for configuring gateway instances.
#[derive(Default)]
pub struct BifrostBuilder {
    cache: CacheConfig,
    breaker: BreakerConfig,
    providers: Vec<Pending>,
    http: Option<Client>,
}

impl BifrostBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the builder from a parsed config file.
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let mut builder = Self::new()
            .cache(config.cache_config())
            .breaker(config.breaker_config());
        for provider in config.provider_configs()? {
            builder = builder.provider(provider);
        }
        Ok(builder)
    }

    /// Response cache capacity and default TTL.
    pub fn cache(mut self, config: CacheConfig) -> Self {
        self.cache = config;
        self
    }

    /// Breaker thresholds for providers without their own override.
    pub fn breaker(mut self, config: BreakerConfig) -> Self {
        self.breaker = config;
        self
    }

    /// Add a provider backed by the adapter for `config.kind`.
    ///
    /// The credential is resolved at [`build`](Self::build); a provider
    /// whose credential is missing is left out with a warning.
    pub fn provider(mut self, config: ProviderConfig) -> Self {
        self.providers.push(Pending::Configured(config));
        self
    }

    /// Add a provider with a caller-supplied adapter (fakes, in-house backends).
    pub fn custom_provider(
        mut self,
        config: ProviderConfig,
        provider: Arc<dyn CompletionProvider>,
    ) -> Self {
        self.providers.push(Pending::Custom(config, provider));
        self
    }

    /// Share an existing HTTP client instead of building one.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http = Some(client);
        self
    }

    /// Build the gateway.
    pub fn build(self) -> Result<LlmGateway> {
        if self.cache.max_entries == 0 {
            return Err(BifrostError::Configuration(
                "cache max_entries must be at least 1".into(),
            ));
        }
        if self.cache.default_ttl > MAX_TTL {
            return Err(BifrostError::Configuration(format!(
                "cache default_ttl exceeds the {}s maximum",
                MAX_TTL.as_secs()
            )));
        }

        let http = match self.http {
            Some(client) => client,
            None => http::default_client()?,
        };

        let mut registry = ProviderRegistry::with_breaker_config(self.breaker);
        for pending in self.providers {
            match pending {
                Pending::Configured(config) => {
                    let Some(api_key) = config.credential.resolve() else {
                        warn!(
                            provider = %config.name,
                            credential = ?config.credential,
                            "credential not set, provider disabled"
                        );
                        continue;
                    };
                    let provider = build_provider(&config, api_key, &http)?;
                    registry.register(config, provider)?;
                }
                Pending::Custom(config, provider) => registry.register(config, provider)?,
            }
        }

        if registry.is_empty() {
            warn!("no providers configured; every request will fail");
        } else {
            debug!(providers = ?registry.provider_names(), "gateway ready");
        }

        let cache = ResponseCache::new(&self.cache);
        Ok(LlmGateway::new(FailoverExecutor::new(registry, cache)))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::types::{Credential, ProviderKind};

    #[test]
    fn zero_cache_capacity_rejected() {
        let result = Bifrost::builder()
            .cache(CacheConfig::new().max_entries(0))
            .build();
        assert!(matches!(result, Err(BifrostError::Configuration(_))));
    }

    #[test]
    fn oversized_default_ttl_rejected() {
        let result = Bifrost::builder()
            .cache(CacheConfig::new().default_ttl(Duration::MAX))
            .build();
        assert!(matches!(result, Err(BifrostError::Configuration(_))));
    }

    #[test]
    fn empty_gateway_builds() {
        let gateway = Bifrost::builder().build().unwrap();
        assert!(gateway.registry().is_empty());
    }

    #[test]
    fn missing_credential_skips_provider() {
        let gateway = Bifrost::builder()
            .provider(ProviderConfig::new(
                "openai",
                ProviderKind::OpenAi,
                Credential::env("BIFROST_TEST_UNSET_KEY_4F1C"),
            ))
            .provider(
                ProviderConfig::new("gemini", ProviderKind::Gemini, Credential::inline("g-key"))
                    .priority(2),
            )
            .build()
            .unwrap();
        assert_eq!(gateway.registry().provider_names(), vec!["gemini"]);
    }

    #[test]
    fn duplicate_names_fail_build() {
        let config = ProviderConfig::new("openai", ProviderKind::OpenAi, Credential::inline("k"));
        let result = Bifrost::builder()
            .provider(config.clone())
            .provider(config)
            .build();
        assert!(matches!(result, Err(BifrostError::Configuration(_))));
    }
}
