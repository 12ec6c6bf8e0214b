//! Google Gemini `generateContent` client.
//!
//! See: <https://ai.google.dev/api/generate-content>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::http::{base_url, check_status, decode, endpoint, non_empty, transport_failure};
use super::traits::{CompletionProvider, ProviderResult};
use crate::error::{ProviderError, ProviderFailure};

/// Default base URL for the Gemini API
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Client for the Gemini API.
#[derive(Clone)]
pub struct GeminiClient {
    name: String,
    api_key: String,
    model: String,
    base_url: String,
    http: Client,
    timeout: Duration,
}

impl GeminiClient {
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
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the per-request timeout (default: 30s).
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
        let method = format!("{model}:generateContent");
        let url = endpoint(&self.base_url, &["v1beta", "models", method.as_str()])?;

        let response = self
            .http
            .post(url)
            .timeout(self.timeout)
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateContentRequest {
                system_instruction: Content {
                    role: None,
                    parts: vec![Part {
                        text: system_prompt,
                    }],
                },
                contents: vec![Content {
                    role: Some("user"),
                    parts: vec![Part { text: user_prompt }],
                }],
                generation_config: GenerationConfig { temperature },
            })
            .send()
            .await
            .map_err(|e| transport_failure(e, self.timeout))?;
        let response = check_status(response, model).await?;
        let body: GenerateContentResponse = decode(response).await?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect()
            })
            .unwrap_or_default();
        non_empty(text)
    }
}

#[async_trait]
impl CompletionProvider for GeminiClient {
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
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}
