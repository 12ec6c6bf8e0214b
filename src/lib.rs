//! Bifrost - resilient gateway in front of several LLM vendors
//!
//! Callers ask for text with one call; the gateway answers from its
//! response cache when it can, otherwise it walks the configured providers
//! in priority order, skipping any whose circuit breaker is open, and
//! returns the first answer. Only when every provider has failed or been
//! skipped does an error reach the caller, and that error names each
//! provider and why it failed.
//!
//! # Example
//!
//! ```rust,no_run
//! use bifrost::{Bifrost, Credential, ProviderConfig, ProviderKind};
//!
//! #[tokio::main]
//! async fn main() -> bifrost::Result<()> {
//!     let gateway = Bifrost::builder()
//!         .provider(
//!             ProviderConfig::new("openai", ProviderKind::OpenAi, Credential::env("OPENAI_API_KEY"))
//!                 .priority(1),
//!         )
//!         .provider(
//!             ProviderConfig::new("gemini", ProviderKind::Gemini, Credential::env("GEMINI_API_KEY"))
//!                 .priority(2),
//!         )
//!         .build()?;
//!
//!     let answer = gateway
//!         .generate("You are a helpful assistant.", "What is a bond ladder?", 0.2, None)
//!         .await?;
//!     println!("{answer}");
//!
//!     let metrics = gateway.metrics();
//!     println!("{} requests, {}% cached", metrics.total_requests, metrics.cache_hit_rate_percent);
//!     Ok(())
//! }
//! ```
//!
//! # Configuration file
//!
//! ```rust,no_run
//! use bifrost::{BifrostBuilder, GatewayConfig};
//!
//! # fn main() -> bifrost::Result<()> {
//! let config = GatewayConfig::load(None)?;
//! let gateway = BifrostBuilder::from_config(&config)?.build()?;
//! # Ok(())
//! # }
//! ```

pub mod breaker;
pub mod cache;
pub mod collector;
pub mod config;
pub mod error;
pub mod gateway;
pub mod providers;
pub mod telemetry;
pub mod traits;
pub mod types;

// Re-export main types at crate root
pub use error::{AllProvidersFailed, BifrostError, ProviderError, ProviderFailure, Result};
pub use gateway::{Bifrost, BifrostBuilder, FailoverExecutor, LlmGateway, ProviderStatus};
pub use traits::TextGenerator;

pub use breaker::{BreakerConfig, BreakerSnapshot, BreakerState, CircuitBreaker};
pub use cache::{CacheConfig, CacheKey, ResponseCache};
pub use collector::{MetricsCollector, MetricsSnapshot};
pub use config::GatewayConfig;
pub use providers::{CompletionProvider, ProviderRegistry, ProviderResult};
pub use types::{AttemptRecord, Credential, GenerateRequest, ProviderConfig, ProviderKind};
