//! Core TextGenerator trait

use async_trait::async_trait;

use crate::Result;

/// Anything that turns a prompt pair into text.
///
/// [`LlmGateway`](crate::LlmGateway) is the production implementation;
/// callers that only need generation should depend on this trait so they
/// can be exercised against a fake.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
        model: Option<&str>,
    ) -> Result<String>;
}
