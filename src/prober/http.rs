use anyhow::{Context, Result};
use reqwest::{Client, ClientBuilder, Url};
use tokio::time::{Duration, Instant};

use super::ProbeOutcome;
use crate::util::redact_api_key;

/// Client with no custom headers. `None` leaves the request without a timeout.
pub fn build_client(timeout: Option<Duration>) -> Result<Client> {
    Ok(client_builder(timeout).build()?)
}

pub(crate) fn client_builder(timeout: Option<Duration>) -> ClientBuilder {
    let builder = Client::builder();
    match timeout {
        Some(timeout) => builder.timeout(timeout),
        None => builder,
    }
}

/// Single GET. The body is dropped unread and the status is not checked.
pub async fn probe_status(client: &Client, url: &Url) -> Result<ProbeOutcome> {
    let shown = redact_api_key(url);
    tracing::debug!("GET {}", shown);

    let start = Instant::now();
    let resp = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| e.without_url())
        .with_context(|| format!("GET {} failed", shown))?;
    let elapsed = start.elapsed();

    let status = resp.status();
    tracing::info!("http probe {} returned {} in {:?}", shown, status, elapsed);
    Ok(ProbeOutcome { status, elapsed })
}
