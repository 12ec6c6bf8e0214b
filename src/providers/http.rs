//! HTTP plumbing shared by the vendor adapters.

use std::time::Duration;

use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;

use crate::error::ProviderFailure;
use crate::{BifrostError, Result};

/// Time allowed to establish a connection, independent of the per-call timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest upstream error body echoed into a failure message.
const MAX_ERROR_BODY: usize = 200;

/// Build the HTTP client shared by every adapter of one gateway.
pub fn default_client() -> Result<Client> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| BifrostError::Configuration(format!("failed to build HTTP client: {e}")))
}

/// Map a transport-level error.
pub(crate) fn transport_failure(err: reqwest::Error, timeout: Duration) -> ProviderFailure {
    if err.is_timeout() {
        ProviderFailure::Timeout(timeout)
    } else {
        ProviderFailure::Http(err.to_string())
    }
}

/// Pass successful responses through; map everything else to a failure.
///
/// The error body is read (and truncated) so operators see the vendor's
/// own explanation in the aggregate error.
pub(crate) async fn check_status(
    response: Response,
    model: &str,
) -> std::result::Result<Response, ProviderFailure> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs);
    let body = response.text().await.unwrap_or_default();

    Err(status_failure(status.as_u16(), retry_after, &body, model))
}

fn status_failure(
    status: u16,
    retry_after: Option<Duration>,
    body: &str,
    model: &str,
) -> ProviderFailure {
    let message = truncate(body.trim());
    match status {
        401 | 403 => ProviderFailure::AuthenticationFailed,
        404 => ProviderFailure::ModelNotFound(model.to_string()),
        429 => ProviderFailure::RateLimited { retry_after },
        400..=499 => ProviderFailure::InvalidRequest(format!("{status}: {message}")),
        code => ProviderFailure::Api {
            status: code,
            message,
        },
    }
}

/// Decode a JSON body. The start of an undecodable body is kept in the
/// failure message.
pub(crate) async fn decode<T: DeserializeOwned>(
    response: Response,
) -> std::result::Result<T, ProviderFailure> {
    let body = response
        .text()
        .await
        .map_err(|e| ProviderFailure::Http(e.to_string()))?;
    serde_json::from_str(&body).map_err(|e| {
        ProviderFailure::MalformedResponse(format!("{e} in body: {}", truncate(body.trim())))
    })
}

/// Reject blank completions.
pub(crate) fn non_empty(text: String) -> std::result::Result<String, ProviderFailure> {
    if text.trim().is_empty() {
        Err(ProviderFailure::EmptyResponse)
    } else {
        Ok(text)
    }
}

/// Strip trailing slashes from a configured base URL.
pub(crate) fn base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Append path segments to `base`, percent-encoding each one so a model
/// name can never add segments or a query string of its own.
pub(crate) fn endpoint(
    base: &str,
    segments: &[&str],
) -> std::result::Result<Url, ProviderFailure> {
    let mut url = Url::parse(base)
        .map_err(|e| ProviderFailure::Configuration(format!("invalid base URL {base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| ProviderFailure::Configuration(format!("base URL {base} cannot take a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn truncate(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    }
}
