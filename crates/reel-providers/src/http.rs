//! Shared reqwest plumbing.

use std::time::Duration;

use bytes::Bytes;
use reqwest::{Client, Response};

use crate::error::{ProviderError, ProviderResult};

/// Longest error body kept in [`ProviderError::RequestFailed`].
const MAX_ERROR_BODY: usize = 2048;

pub(crate) fn build_client(timeout: Duration) -> ProviderResult<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("reelforge/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(ProviderError::Network)
}

/// Turn a non-2xx response into [`ProviderError::RequestFailed`].
pub(crate) async fn ensure_success(response: Response) -> ProviderResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let cut = (0..=MAX_ERROR_BODY)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        body.truncate(cut);
    }

    Err(ProviderError::RequestFailed {
        status: status.as_u16(),
        body,
    })
}

/// GET `url` and return the non-empty body.
pub(crate) async fn download(client: &Client, url: &str) -> ProviderResult<Bytes> {
    let response = ensure_success(client.get(url).send().await?).await?;
    let body = response.bytes().await?;
    if body.is_empty() {
        return Err(ProviderError::EmptyResponse);
    }
    Ok(body)
}

/// Read an optional, non-blank environment variable.
pub(crate) fn env_key(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn env_secs(name: &str, default: u64) -> Duration {
    Duration::from_secs(
        std::env::var(name)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(default),
    )
}

pub(crate) fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
