//! Provider registry in priority order.
//!
//! The `ProviderRegistry` owns every configured provider together with its
//! [`ProviderConfig`] and its [`CircuitBreaker`]. Entries are kept sorted by
//! ascending `priority` (lower value = attempted earlier); providers with
//! equal priority keep their registration order, so iteration is
//! deterministic and reproducible in tests.
//!
//! # Attempt order
//!
//! ```text
//!   register(openai,    priority 2)
//!   register(anthropic, priority 1)      ordered():
//!   register(gemini,    priority 2)  ──►   anthropic (1)
//!                                          openai    (2)
//!                                          gemini    (2)  ← tie: later registration
//! ```

use std::sync::Arc;

use super::traits::CompletionProvider;
use crate::breaker::{BreakerConfig, BreakerState, CircuitBreaker};
use crate::types::ProviderConfig;
use crate::{BifrostError, Result};

/// One registered provider: descriptor, adapter, and health gate.
pub struct RegisteredProvider {
    config: ProviderConfig,
    provider: Arc<dyn CompletionProvider>,
    breaker: CircuitBreaker,
}

impl RegisteredProvider {
    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<dyn CompletionProvider> {
        &self.provider
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }
}

impl std::fmt::Debug for RegisteredProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredProvider")
            .field("name", &self.config.name)
            .field("kind", &self.config.kind)
            .field("priority", &self.config.priority)
            .field("state", &self.breaker.state())
            .finish()
    }
}

/// Ordered collection of providers.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    entries: Vec<RegisteredProvider>,
    breaker_config: BreakerConfig,
}

impl ProviderRegistry {
    /// Create a new empty registry with default breaker thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry whose providers get `config` unless their
    /// own [`ProviderConfig::breaker`] overrides it.
    pub fn with_breaker_config(config: BreakerConfig) -> Self {
        Self {
            entries: Vec::new(),
            breaker_config: config,
        }
    }

    /// Breaker thresholds applied to providers without an override.
    pub fn breaker_config(&self) -> &BreakerConfig {
        &self.breaker_config
    }

    /// Register a provider.
    ///
    /// Inserted after every entry with priority less than or equal to its
    /// own. Names must be unique since breakers, errors and metrics are
    /// attributed by name.
    pub fn register(
        &mut self,
        config: ProviderConfig,
        provider: Arc<dyn CompletionProvider>,
    ) -> Result<()> {
        if self.entries.iter().any(|e| e.config.name == config.name) {
            return Err(BifrostError::Configuration(format!(
                "duplicate provider name '{}'",
                config.name
            )));
        }
        let breaker_config = config.breaker.unwrap_or(self.breaker_config);
        if breaker_config.failure_threshold == 0 {
            return Err(BifrostError::Configuration(format!(
                "provider '{}': failure_threshold must be at least 1",
                config.name
            )));
        }

        let position = self
            .entries
            .partition_point(|e| e.config.priority <= config.priority);
        let breaker = CircuitBreaker::new(config.name.clone(), breaker_config);
        self.entries.insert(
            position,
            RegisteredProvider {
                config,
                provider,
                breaker,
            },
        );
        Ok(())
    }

    /// Providers in attempt order.
    pub fn ordered(&self) -> &[RegisteredProvider] {
        &self.entries
    }

    /// Look up a provider by name.
    pub fn get(&self, name: &str) -> Option<&RegisteredProvider> {
        self.entries.iter().find(|e| e.config.name == name)
    }

    /// Provider names in attempt order.
    pub fn provider_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.config.name.clone()).collect()
    }

    /// Number of providers whose breaker is not OPEN.
    pub fn active_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.breaker.state() != BreakerState::Open)
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderResult;
    use crate::types::{Credential, ProviderKind};
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl CompletionProvider for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn invoke(
            &self,
            _system_prompt: &str,
            user_prompt: &str,
            _model: Option<&str>,
            _temperature: f32,
        ) -> ProviderResult<String> {
            Ok(user_prompt.to_string())
        }
    }

    fn config(name: &str, priority: i32) -> ProviderConfig {
        ProviderConfig::new(name, ProviderKind::OpenAi, Credential::inline("k")).priority(priority)
    }

    #[test]
    fn ordered_by_ascending_priority() {
        let mut registry = ProviderRegistry::new();
        registry.register(config("b", 2), Arc::new(Echo)).unwrap();
        registry.register(config("a", 1), Arc::new(Echo)).unwrap();
        registry.register(config("c", 3), Arc::new(Echo)).unwrap();

        assert_eq!(registry.provider_names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn ties_keep_registration_order() {
        let mut registry = ProviderRegistry::new();
        registry.register(config("first", 1), Arc::new(Echo)).unwrap();
        registry.register(config("zero", 0), Arc::new(Echo)).unwrap();
        registry.register(config("second", 1), Arc::new(Echo)).unwrap();
        registry.register(config("third", 1), Arc::new(Echo)).unwrap();

        assert_eq!(
            registry.provider_names(),
            vec!["zero", "first", "second", "third"]
        );
    }

    #[test]
    fn order_is_stable_across_queries() {
        let mut registry = ProviderRegistry::new();
        registry.register(config("A", 5), Arc::new(Echo)).unwrap();
        registry.register(config("B", 1), Arc::new(Echo)).unwrap();

        for _ in 0..3 {
            let names: Vec<_> = registry.ordered().iter().map(|e| e.name()).collect();
            assert_eq!(names, vec!["B", "A"]);
        }
    }

    #[test]
    fn duplicate_names_rejected() {
        let mut registry = ProviderRegistry::new();
        registry.register(config("openai", 1), Arc::new(Echo)).unwrap();
        let err = registry
            .register(config("openai", 2), Arc::new(Echo))
            .unwrap_err();
        assert!(matches!(err, BifrostError::Configuration(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn per_provider_breaker_override() {
        let mut registry = ProviderRegistry::with_breaker_config(BreakerConfig::new());
        registry
            .register(
                config("flaky", 1).breaker(BreakerConfig::new().failure_threshold(2)),
                Arc::new(Echo),
            )
            .unwrap();
        registry.register(config("steady", 2), Arc::new(Echo)).unwrap();

        assert_eq!(
            registry.get("flaky").unwrap().breaker().config().failure_threshold,
            2
        );
        assert_eq!(
            registry.get("steady").unwrap().breaker().config().failure_threshold,
            5
        );
    }

    #[test]
    fn zero_threshold_rejected() {
        let mut registry =
            ProviderRegistry::with_breaker_config(BreakerConfig::new().failure_threshold(0));
        assert!(registry.register(config("x", 1), Arc::new(Echo)).is_err());
    }

    #[test]
    fn active_count_tracks_open_breakers() {
        let mut registry =
            ProviderRegistry::with_breaker_config(BreakerConfig::new().failure_threshold(1));
        registry.register(config("a", 1), Arc::new(Echo)).unwrap();
        registry.register(config("b", 2), Arc::new(Echo)).unwrap();
        assert_eq!(registry.active_count(), 2);

        registry.get("a").unwrap().breaker().report_failure();
        assert_eq!(registry.active_count(), 1);
    }
}
