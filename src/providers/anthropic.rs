//! Anthropic messages API client.
//!
//! See: <https://docs.anthropic.com/en/api/messages>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::http::{base_url, check_status, decode, endpoint, non_empty, transport_failure};
use super::traits::{CompletionProvider, ProviderResult};
use crate::error::{ProviderError, ProviderFailure};

/// Default base URL for the Anthropic API
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

const API_VERSION: &str = "2023-06-01";

/// The messages API requires an explicit output cap.
const MAX_TOKENS: u32 = 2048;

/// Client for Anthropic's messages endpoint.
#[derive(Clone)]
pub struct AnthropicClient {
    name: String,
    api_key: String,
    model: String,
    base_url: String,
    http: Client,
    timeout: Duration,
}

impl AnthropicClient {
    pub fn new(
        name: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        http: Client,
    ) -> Self {
        Self::with_base_url(name, api_key, model, DEFAULT_BASE_URL, http)
    }

    /// Create a client with a custom base URL (for testing with wiremock).
    pub fn with_base_url(
        name: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        base: impl AsRef<str>,
        http: Client,
    ) -> Self {
        Self {
            name: name.into(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url(base.as_ref()),
            http,
            timeout: Duration::from_secs(60),
        }
    }

    /// Set the per-request timeout (default: 60s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: &str,
        temperature: f32,
    ) -> Result<String, ProviderFailure> {
        let url = endpoint(&self.base_url, &["v1", "messages"])?;
        let response = self
            .http
            .post(url)
            .timeout(self.timeout)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&MessagesRequest {
                model,
                max_tokens: MAX_TOKENS,
                temperature,
                system: system_prompt,
                messages: [UserMessage {
                    role: "user",
                    content: user_prompt,
                }],
            })
            .send()
            .await
            .map_err(|e| transport_failure(e, self.timeout))?;
        let response = check_status(response, model).await?;
        let body: MessagesResponse = decode(response).await?;

        let text: String = body
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();
        non_empty(text)
    }
}

#[async_trait]
impl CompletionProvider for AnthropicClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: Option<&str>,
        temperature: f32,
    ) -> ProviderResult<String> {
        let model = model.unwrap_or(&self.model);
        self.complete(system_prompt, user_prompt, model, temperature)
            .await
            .map_err(|failure| ProviderError::new(&self.name, failure))
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: [UserMessage<'a>; 1],
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}
