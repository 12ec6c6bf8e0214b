//! Provider descriptors.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::breaker::BreakerConfig;

/// Upstream backend family.
///
/// A closed set: each variant has exactly one adapter in
/// [`providers`](crate::providers), chosen when the gateway is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// OpenAI chat completions, or any OpenAI-compatible endpoint.
    #[serde(rename = "openai")]
    OpenAi,
    /// Azure-hosted OpenAI deployment.
    #[serde(rename = "azure_openai")]
    AzureOpenAi,
    /// Anthropic messages API.
    Anthropic,
    /// Google Gemini `generateContent`.
    Gemini,
}

impl ProviderKind {
    /// Conventional provider name for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::AzureOpenAi => "azure_openai",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
        }
    }

    /// Model used when the configuration does not name one.
    pub fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::AzureOpenAi => "gpt-4",
            Self::Anthropic => "claude-3-5-sonnet-20241022",
            Self::Gemini => "gemini-1.5-flash",
        }
    }

    /// Per-call timeout used when the configuration does not set one.
    pub fn default_timeout(self) -> Duration {
        match self {
            Self::Anthropic => Duration::from_secs(60),
            Self::OpenAi | Self::AzureOpenAi | Self::Gemini => Duration::from_secs(30),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a provider secret.
///
/// `Debug` never prints inline secrets.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// The secret itself.
    Inline(String),
    /// Name of an environment variable holding the secret.
    Env(String),
}

impl Credential {
    pub fn inline(secret: impl Into<String>) -> Self {
        Self::Inline(secret.into())
    }

    pub fn env(var: impl Into<String>) -> Self {
        Self::Env(var.into())
    }

    /// Resolve to the secret value; `None` if the variable is unset or empty.
    pub fn resolve(&self) -> Option<String> {
        let value = match self {
            Self::Inline(secret) => secret.clone(),
            Self::Env(var) => std::env::var(var).ok()?,
        };
        (!value.is_empty()).then_some(value)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline(_) => f.write_str("Inline(<redacted>)"),
            Self::Env(var) => f.debug_tuple("Env").field(var).finish(),
        }
    }
}

/// Immutable description of one configured provider.
///
/// Lower `priority` is attempted earlier; ties keep registration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub name: String,
    pub kind: ProviderKind,
    pub credential: Credential,
    /// Default model when the request carries no override.
    pub model: String,
    /// Base URL override for the backend.
    pub endpoint: Option<String>,
    pub priority: i32,
    /// Upper bound on a single invocation.
    pub timeout: Duration,
    /// Per-provider breaker override; `None` uses the gateway default.
    pub breaker: Option<BreakerConfig>,
}

impl ProviderConfig {
    /// Config with the kind's default model and timeout, priority 0.
    pub fn new(name: impl Into<String>, kind: ProviderKind, credential: Credential) -> Self {
        Self {
            name: name.into(),
            kind,
            credential,
            model: kind.default_model().to_string(),
            endpoint: None,
            priority: 0,
            timeout: kind.default_timeout(),
            breaker: None,
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn breaker(mut self, config: BreakerConfig) -> Self {
        self.breaker = Some(config);
        self
    }
}
