//! Provider capability trait.
//!
//! Every upstream backend is wrapped in a type implementing
//! [`CompletionProvider`]. Adapters perform exactly one outbound call per
//! `invoke` and never retry: ordering, failover and backoff all belong to
//! the [`FailoverExecutor`](crate::gateway::FailoverExecutor).
//!
//! # Example
//!
//! ```ignore
//! struct Canned;
//!
//! #[async_trait]
//! impl CompletionProvider for Canned {
//!     fn name(&self) -> &str {
//!         "canned"
//!     }
//!
//!     async fn invoke(&self, _system: &str, _user: &str, _model: Option<&str>, _t: f32)
//!         -> ProviderResult<String>
//!     {
//!         Ok("42".to_string())
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::ProviderError;

/// Result type for a single provider invocation.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Uniform single-turn text generation over one upstream backend.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name for logging/debugging.
    fn name(&self) -> &str;

    /// Generate text for a system + user prompt pair.
    ///
    /// `model` overrides the adapter's configured default when present.
    async fn invoke(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: Option<&str>,
        temperature: f32,
    ) -> ProviderResult<String>;
}
