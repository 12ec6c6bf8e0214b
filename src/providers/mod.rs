//! Upstream provider adapters and the registry that orders them.
//!
//! Each [`ProviderKind`] maps to exactly one adapter; [`build_provider`]
//! performs that selection once, at gateway construction.

pub mod anthropic;
pub mod gemini;
pub mod http;
pub mod openai;
pub mod registry;
pub mod traits;

pub use anthropic::AnthropicClient;
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;
pub use registry::{ProviderRegistry, RegisteredProvider};
pub use traits::{CompletionProvider, ProviderResult};

use std::sync::Arc;

use reqwest::Client;

use crate::types::{ProviderConfig, ProviderKind};
use crate::{BifrostError, Result};

/// Instantiate the adapter for `config.kind`.
///
/// `api_key` is the already-resolved credential. Azure OpenAI has no public
/// default host, so it requires `config.endpoint`.
pub fn build_provider(
    config: &ProviderConfig,
    api_key: String,
    http: &Client,
) -> Result<Arc<dyn CompletionProvider>> {
    let name = config.name.clone();
    let model = config.model.clone();
    let http = http.clone();
    let endpoint = config.endpoint.as_deref();
    if let Some(url) = endpoint {
        validate_endpoint(&config.name, url)?;
    }

    let provider: Arc<dyn CompletionProvider> = match config.kind {
        ProviderKind::OpenAi => {
            let client = match endpoint {
                Some(url) => OpenAiClient::with_base_url(name, api_key, model, url, http),
                None => OpenAiClient::new(name, api_key, model, http),
            };
            Arc::new(client.timeout(config.timeout))
        }
        ProviderKind::AzureOpenAi => {
            let url = endpoint.ok_or_else(|| {
                BifrostError::Configuration(format!(
                    "provider '{}': azure_openai requires an endpoint",
                    config.name
                ))
            })?;
            Arc::new(OpenAiClient::azure(name, api_key, model, url, http).timeout(config.timeout))
        }
        ProviderKind::Anthropic => {
            let client = match endpoint {
                Some(url) => AnthropicClient::with_base_url(name, api_key, model, url, http),
                None => AnthropicClient::new(name, api_key, model, http),
            };
            Arc::new(client.timeout(config.timeout))
        }
        ProviderKind::Gemini => {
            let client = match endpoint {
                Some(url) => GeminiClient::with_base_url(name, api_key, model, url, http),
                None => GeminiClient::new(name, api_key, model, http),
            };
            Arc::new(client.timeout(config.timeout))
        }
    };
    Ok(provider)
}

fn validate_endpoint(provider: &str, url: &str) -> Result<()> {
    let parsed = reqwest::Url::parse(url).map_err(|e| {
        BifrostError::Configuration(format!("provider '{provider}': invalid endpoint '{url}': {e}"))
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(BifrostError::Configuration(format!(
            "provider '{provider}': endpoint scheme must be http or https, got '{scheme}'"
        ))),
    }
}
