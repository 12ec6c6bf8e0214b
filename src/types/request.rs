//! Generation requests and attempt records.

use std::time::Duration;

use crate::cache::MAX_TTL;
use crate::error::ProviderFailure;
use crate::{BifrostError, Result};

/// Highest sampling temperature accepted by the supported vendors.
pub const MAX_TEMPERATURE: f32 = 2.0;

/// A single text-generation request.
///
/// ```rust
/// # use bifrost::GenerateRequest;
/// # use std::time::Duration;
/// let request = GenerateRequest::new("You are a market analyst.", "Summarise today's moves.")
///     .temperature(0.2)
///     .ttl(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    /// Sampling temperature (0.0 to 2.0). Default: 0.0.
    pub temperature: f32,
    /// Model override; `None` uses each provider's configured default.
    pub model: Option<String>,
    /// Cache lifetime for the answer; `None` uses the gateway default.
    pub ttl: Option<Duration>,
    /// Skip both cache lookup and cache store.
    pub no_cache: bool,
}

impl GenerateRequest {
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            temperature: 0.0,
            model: None,
            ttl: None,
            no_cache: false,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn no_cache(mut self) -> Self {
        self.no_cache = true;
        self
    }

    /// Reject requests no provider could sensibly serve.
    pub fn validate(&self) -> Result<()> {
        if self.system_prompt.trim().is_empty() {
            return Err(BifrostError::InvalidInput(
                "system prompt must not be empty".into(),
            ));
        }
        if self.user_prompt.trim().is_empty() {
            return Err(BifrostError::InvalidInput(
                "user prompt must not be empty".into(),
            ));
        }
        if !self.temperature.is_finite() || !(0.0..=MAX_TEMPERATURE).contains(&self.temperature) {
            return Err(BifrostError::InvalidInput(format!(
                "temperature {} outside 0.0..={MAX_TEMPERATURE}",
                self.temperature
            )));
        }
        if self.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
            return Err(BifrostError::InvalidInput(
                "model override must not be empty".into(),
            ));
        }
        if self.ttl.is_some_and(|ttl| ttl > MAX_TTL) {
            return Err(BifrostError::InvalidInput(format!(
                "cache ttl exceeds the {}s maximum",
                MAX_TTL.as_secs()
            )));
        }
        Ok(())
    }
}

/// Outcome of one provider invocation. Lives only long enough to update the
/// breaker and the collector.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
    pub provider: String,
    pub latency: Duration,
    pub error: Option<ProviderFailure>,
}

impl AttemptRecord {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let request = GenerateRequest::new("sys", "hi");
        assert_eq!(request.temperature, 0.0);
        assert!(request.model.is_none());
        assert!(request.ttl.is_none());
        assert!(!request.no_cache);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn rejects_empty_prompts() {
        assert!(matches!(
            GenerateRequest::new("", "hi").validate(),
            Err(BifrostError::InvalidInput(_))
        ));
        assert!(matches!(
            GenerateRequest::new("sys", "   ").validate(),
            Err(BifrostError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_temperature() {
        for t in [-0.1, 2.5, f32::NAN, f32::INFINITY] {
            let request = GenerateRequest::new("sys", "hi").temperature(t);
            assert!(request.validate().is_err(), "temperature {t} accepted");
        }
        assert!(GenerateRequest::new("sys", "hi").temperature(2.0).validate().is_ok());
    }

    #[test]
    fn rejects_blank_model_override() {
        let request = GenerateRequest::new("sys", "hi").model(" ");
        assert!(request.validate().is_err());
    }

    #[test]
    fn rejects_ttl_beyond_maximum() {
        let request = GenerateRequest::new("sys", "hi").ttl(Duration::MAX);
        assert!(matches!(
            request.validate(),
            Err(BifrostError::InvalidInput(msg)) if msg.contains("ttl")
        ));
        assert!(GenerateRequest::new("sys", "hi").ttl(MAX_TTL).validate().is_ok());
    }
}
