//! Configuration loading.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.bifrost/config.toml` (user)
//! 3. `/etc/bifrost/config.toml` (system)
//!
//! Without a file, [`GatewayConfig::from_env`] builds the provider list from
//! the well-known API key variables.
//!
//! ```toml
//! [cache]
//! max_entries = 1000
//! default_ttl_secs = 3600
//!
//! [breaker]
//! failure_threshold = 5
//! reset_timeout_secs = 60
//!
//! [[providers]]
//! kind = "openai"
//! api_key_env = "OPENAI_API_KEY"
//! model = "gpt-4o-mini"
//! priority = 1
//!
//! [[providers]]
//! kind = "gemini"
//! priority = 2
//! [providers.breaker]
//! failure_threshold = 3
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::breaker::BreakerConfig;
use crate::cache::CacheConfig;
use crate::types::{Credential, ProviderConfig, ProviderKind};
use crate::{BifrostError, Result};

/// Gateway configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub breaker: BreakerSection,
    #[serde(default)]
    pub providers: Vec<ProviderSection>,
}

/// Response cache settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    /// LRU bound (default: 1000).
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
    /// TTL for requests without their own (default: 3600).
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            default_ttl_secs: default_ttl_secs(),
        }
    }
}

fn default_max_entries() -> u64 {
    1000
}

fn default_ttl_secs() -> u64 {
    3600
}

/// Global breaker thresholds.
#[derive(Debug, Clone, Deserialize)]
pub struct BreakerSection {
    /// Consecutive failures before opening (default: 5).
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Cooldown in seconds (default: 60).
    #[serde(default = "default_reset_timeout_secs")]
    pub reset_timeout_secs: u64,
}

impl Default for BreakerSection {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            reset_timeout_secs: default_reset_timeout_secs(),
        }
    }
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_reset_timeout_secs() -> u64 {
    60
}

/// Per-provider breaker override; unset fields inherit the global values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BreakerOverride {
    #[serde(default)]
    pub failure_threshold: Option<u32>,
    #[serde(default)]
    pub reset_timeout_secs: Option<u64>,
}

/// One `[[providers]]` entry.
#[derive(Clone, Deserialize)]
pub struct ProviderSection {
    /// Unique name (default: the kind, e.g. `"openai"`).
    #[serde(default)]
    pub name: Option<String>,
    pub kind: ProviderKind,
    /// Inline secret. Prefer `api_key_env`.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Environment variable holding the secret (default: per kind).
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub breaker: Option<BreakerOverride>,
}

impl fmt::Debug for ProviderSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSection")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_key_env", &self.api_key_env)
            .field("model", &self.model)
            .field("priority", &self.priority)
            .field("timeout_secs", &self.timeout_secs)
            .field("endpoint", &self.endpoint)
            .field("breaker", &self.breaker)
            .finish()
    }
}

/// Provider kind → environment variable name mapping.
const PROVIDER_ENV_VARS: &[(ProviderKind, &str)] = &[
    (ProviderKind::OpenAi, "OPENAI_API_KEY"),
    (ProviderKind::AzureOpenAi, "AZURE_OPENAI_API_KEY"),
    (ProviderKind::Anthropic, "ANTHROPIC_API_KEY"),
    (ProviderKind::Gemini, "GEMINI_API_KEY"),
];

/// Azure has no public host; the resource endpoint comes from here.
const AZURE_ENDPOINT_VAR: &str = "AZURE_OPENAI_ENDPOINT";

fn default_env_var(kind: ProviderKind) -> &'static str {
    PROVIDER_ENV_VARS
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, var)| *var)
        .unwrap_or("")
}

impl GatewayConfig {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided)
    /// 2. `~/.bifrost/config.toml`
    /// 3. `/etc/bifrost/config.toml`
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_config_path(explicit_path)?;
        let content = fs::read_to_string(&path).map_err(|e| {
            BifrostError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            BifrostError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| BifrostError::Configuration(format!("Failed to parse config: {e}")))
    }

    /// Whether a config file exists at one of the standard locations.
    pub fn default_path() -> Option<PathBuf> {
        Self::resolve_config_path(None).ok()
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(path.to_path_buf());
            }
            return Err(BifrostError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".bifrost").join("config.toml");
            if user_config.exists() {
                return Ok(user_config);
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/bifrost/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }

        Err(BifrostError::Configuration(
            "No config file found. Create ~/.bifrost/config.toml or /etc/bifrost/config.toml"
                .to_string(),
        ))
    }

    /// Providers from the process environment.
    ///
    /// | Variable | Provider | Model | Priority |
    /// |---|---|---|---|
    /// | `OPENAI_API_KEY` | openai | gpt-4o-mini | 1 |
    /// | `AZURE_OPENAI_API_KEY` + `AZURE_OPENAI_ENDPOINT` | azure_openai | gpt-4 | 2 |
    /// | `ANTHROPIC_API_KEY` | anthropic | claude-3-5-sonnet-20241022 | 3 |
    /// | `GEMINI_API_KEY` | gemini | gemini-1.5-flash | 4 |
    pub fn from_env() -> Self {
        Self::from_env_with(|var| std::env::var(var).ok())
    }

    /// [`from_env`](Self::from_env) with an injectable variable lookup.
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let present = |var: &str| lookup(var).filter(|v| !v.is_empty());

        let providers = PROVIDER_ENV_VARS
            .iter()
            .zip(1..)
            .filter_map(|(&(kind, var), priority)| {
                present(var)?;
                let endpoint = match kind {
                    ProviderKind::AzureOpenAi => Some(present(AZURE_ENDPOINT_VAR)?),
                    _ => None,
                };
                Some(ProviderSection {
                    name: None,
                    kind,
                    api_key: None,
                    api_key_env: Some(var.to_string()),
                    model: None,
                    priority,
                    timeout_secs: None,
                    endpoint,
                    breaker: None,
                })
            })
            .collect();

        Self {
            providers,
            ..Self::default()
        }
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new()
            .max_entries(self.cache.max_entries)
            .default_ttl(Duration::from_secs(self.cache.default_ttl_secs))
    }

    pub fn breaker_config(&self) -> BreakerConfig {
        BreakerConfig::new()
            .failure_threshold(self.breaker.failure_threshold)
            .reset_timeout(Duration::from_secs(self.breaker.reset_timeout_secs))
    }

    /// Typed provider descriptors, in file order.
    pub fn provider_configs(&self) -> Result<Vec<ProviderConfig>> {
        let global = self.breaker_config();
        self.providers
            .iter()
            .map(|section| section.to_provider_config(global))
            .collect()
    }
}

impl ProviderSection {
    fn to_provider_config(&self, global: BreakerConfig) -> Result<ProviderConfig> {
        let name = self
            .name
            .clone()
            .unwrap_or_else(|| self.kind.as_str().to_string());

        let credential = match (&self.api_key, &self.api_key_env) {
            (Some(_), Some(_)) => {
                return Err(BifrostError::Configuration(format!(
                    "provider '{name}': set either api_key or api_key_env, not both"
                )));
            }
            (Some(key), None) => Credential::inline(key),
            (None, Some(var)) => Credential::env(var),
            (None, None) => Credential::env(default_env_var(self.kind)),
        };

        let mut config = ProviderConfig::new(name, self.kind, credential).priority(self.priority);
        if let Some(model) = &self.model {
            config = config.model(model);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.timeout(Duration::from_secs(secs));
        }
        if let Some(endpoint) = &self.endpoint {
            config = config.endpoint(endpoint);
        }
        if let Some(over) = &self.breaker {
            let mut breaker = global;
            if let Some(n) = over.failure_threshold {
                breaker = breaker.failure_threshold(n);
            }
            if let Some(secs) = over.reset_timeout_secs {
                breaker = breaker.reset_timeout(Duration::from_secs(secs));
            }
            config = config.breaker(breaker);
        }
        Ok(config)
    }
}
