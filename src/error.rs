//! Bifrost error types

use std::fmt;
use std::time::Duration;

/// Vendor-neutral reason a single provider invocation failed.
///
/// Adapters translate HTTP statuses and transport errors into one of these
/// kinds so the failover loop can branch on [`is_transient()`](Self::is_transient)
/// without inspecting message strings.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderFailure {
    // Transient: the provider may recover on its own
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("empty response from model")]
    EmptyResponse,

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    // Configuration: will keep failing until an operator intervenes
    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ProviderFailure {
    /// Whether the failure looks temporary (timeouts, throttling, 5xx).
    ///
    /// Everything else is a configuration problem: bad credentials, unknown
    /// model, or a request the provider will never accept.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_)
            | Self::Timeout(_)
            | Self::RateLimited { .. }
            | Self::EmptyResponse
            | Self::MalformedResponse(_) => true,
            Self::Api { status, .. } => *status >= 500,
            Self::AuthenticationFailed
            | Self::ModelNotFound(_)
            | Self::InvalidRequest(_)
            | Self::Configuration(_) => false,
        }
    }

    /// Provider-supplied backoff hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// A failure attributed to one named provider.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{provider}: {failure}")]
pub struct ProviderError {
    pub provider: String,
    pub failure: ProviderFailure,
}

impl ProviderError {
    pub fn new(provider: impl Into<String>, failure: ProviderFailure) -> Self {
        Self {
            provider: provider.into(),
            failure,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.failure.is_transient()
    }

    pub fn is_configuration(&self) -> bool {
        !self.failure.is_transient()
    }
}

/// Aggregate failure raised when no provider produced an answer.
///
/// `failures` holds every attempted provider in attempt order; `skipped`
/// names providers that were not attempted because their circuit was open.
/// Both are empty when the registry has no providers at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllProvidersFailed {
    pub failures: Vec<ProviderError>,
    pub skipped: Vec<String>,
}

impl AllProvidersFailed {
    /// Names of the providers that were actually invoked, in order.
    pub fn attempted(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.provider.as_str()).collect()
    }

    /// True when nothing was invoked (empty registry or every circuit open).
    pub fn nothing_attempted(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for AllProvidersFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures.is_empty() && self.skipped.is_empty() {
            return f.write_str("all providers failed: no providers configured");
        }
        f.write_str("all providers failed")?;
        for (i, failure) in self.failures.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            let kind = if failure.is_configuration() {
                " [configuration]"
            } else {
                ""
            };
            write!(f, "{sep}{failure}{kind}")?;
        }
        if !self.skipped.is_empty() {
            write!(f, " (circuit open: {})", self.skipped.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for AllProvidersFailed {}

/// Bifrost error types
#[derive(Debug, thiserror::Error)]
pub enum BifrostError {
    #[error(transparent)]
    AllProvidersFailed(#[from] AllProvidersFailed),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Result type alias for Bifrost operations
pub type Result<T> = std::result::Result<T, BifrostError>;
