// ============================================================================
// Shared HTTP plumbing for the API clients
// ============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

// Yahoo rejects requests without a browser-looking User-Agent.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Builds the client every endpoint shares. One timeout covers connect and
/// body; there is no retry layer on top.
pub fn build(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("building HTTP client")
}

/// GETs a URL and deserializes the JSON body. Non-2xx statuses are errors;
/// the caller decides what falling back looks like.
pub async fn get_json<T: DeserializeOwned>(client: &reqwest::Client, url: &str) -> Result<T> {
    debug!(url = %url, "sending request");
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("requesting {}", url))?;

    let status = response.status();
    debug!(status = %status, "received response");
    if !status.is_success() {
        error!(status = %status, url = %url, "request rejected");
        anyhow::bail!("request to {} failed with HTTP {}", url, status);
    }

    response
        .json()
        .await
        .with_context(|| format!("parsing JSON from {}", url))
}
