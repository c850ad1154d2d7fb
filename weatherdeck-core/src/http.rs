use anyhow::Context;
use reqwest::Client;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// HTTP client shared by the weather provider and the IP geolocator.
pub(crate) fn client(purpose: &str) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .with_context(|| format!("Failed to build HTTP client for {purpose}"))
}
