//! OpenAI chat completions client, also used for Azure OpenAI deployments.
//!
//! Both speak the same request/response shape and differ only in URL layout
//! and authentication header. Pointing the plain OpenAI flavour at another
//! base URL covers OpenAI-compatible backends (OpenRouter, Ollama, vLLM).
//!
//! See: <https://platform.openai.com/docs/api-reference/chat/create>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use super::http::{base_url, check_status, decode, endpoint, non_empty, transport_failure};
use super::traits::{CompletionProvider, ProviderResult};
use crate::error::{ProviderError, ProviderFailure};

/// Default base URL for the OpenAI API
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// API version pinned for Azure OpenAI deployments
pub const AZURE_API_VERSION: &str = "2024-02-15-preview";

#[derive(Debug, Clone)]
enum Flavor {
    OpenAi,
    Azure,
}

/// Client for OpenAI-style chat completions.
#[derive(Clone)]
pub struct OpenAiClient {
    name: String,
    api_key: String,
    model: String,
    base_url: String,
    http: Client,
    timeout: Duration,
    flavor: Flavor,
}

impl OpenAiClient {
    /// Client for api.openai.com.
    pub fn new(
        name: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        http: Client,
    ) -> Self {
        Self::with_base_url(name, api_key, model, DEFAULT_BASE_URL, http)
    }

    /// Client for any OpenAI-compatible base URL (also used by wiremock tests).
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
            timeout: Duration::from_secs(30),
            flavor: Flavor::OpenAi,
        }
    }

    /// Client for an Azure OpenAI resource; `deployment` takes the place of the model.
    pub fn azure(
        name: impl Into<String>,
        api_key: impl Into<String>,
        deployment: impl Into<String>,
        endpoint: impl AsRef<str>,
        http: Client,
    ) -> Self {
        Self {
            flavor: Flavor::Azure,
            ..Self::with_base_url(name, api_key, deployment, endpoint, http)
        }
    }

    /// Set the per-request timeout (default: 30s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn url(&self, model: &str) -> Result<Url, ProviderFailure> {
        match self.flavor {
            Flavor::OpenAi => endpoint(&self.base_url, &["chat", "completions"]),
            Flavor::Azure => {
                let mut url = endpoint(
                    &self.base_url,
                    &["openai", "deployments", model, "chat", "completions"],
                )?;
                url.query_pairs_mut()
                    .append_pair("api-version", AZURE_API_VERSION);
                Ok(url)
            }
        }
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: &str,
        temperature: f32,
    ) -> Result<String, ProviderFailure> {
        let request = self
            .http
            .post(self.url(model)?)
            .timeout(self.timeout)
            .json(&ChatRequest {
                model,
                temperature,
                messages: [
                    ChatMessage {
                        role: "system",
                        content: system_prompt,
                    },
                    ChatMessage {
                        role: "user",
                        content: user_prompt,
                    },
                ],
            });
        let request = match self.flavor {
            Flavor::OpenAi => request.bearer_auth(&self.api_key),
            Flavor::Azure => request.header("api-key", &self.api_key),
        };

        let response = request
            .send()
            .await
            .map_err(|e| transport_failure(e, self.timeout))?;
        let response = check_status(response, model).await?;
        let body: ChatResponse = decode(response).await?;

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        non_empty(text)
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
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
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
