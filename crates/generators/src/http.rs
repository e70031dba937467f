//! Shared HTTP plumbing for the remote adapters.

use std::time::Duration;

use mangareel_common::error::{MangareelError, MangareelResult};
use serde::de::DeserializeOwned;

const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Build a client with the configured request timeout.
pub(crate) fn build_client(timeout_secs: u64) -> MangareelResult<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .build()?;
    Ok(client)
}

/// Strip trailing slashes so endpoint paths can be appended with `/`.
pub(crate) fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Require a non-empty credential.
pub(crate) fn require_key(key: Option<&str>, what: &str) -> MangareelResult<String> {
    match key.map(str::trim) {
        Some(k) if !k.is_empty() => Ok(k.to_string()),
        _ => Err(MangareelError::config(format!("{what} API key not configured"))),
    }
}

/// Check the status and decode a JSON body.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> MangareelResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        return Err(MangareelError::Api {
            status: status.as_u16(),
            message: body.trim().to_string(),
        });
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| MangareelError::invalid_response(e.to_string()))
}
