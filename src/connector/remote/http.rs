//! HTTP remote prefix-listing client.
//!
//! Probes `<remote_url>/.meta/prefixes.txt` with a bounded timeout.
//! Status mapping: 2xx → supported listing, 4xx → listing unsupported
//! (a stable negative), 5xx / transport error / timeout → transient
//! failure surfaced as `DomainError::RemoteFetch`.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::application::{RemoteListing, RemoteListingClient};
use crate::domain::{DomainError, RepositoryConfig};

/// Well-known location of the published prefix listing on a remote.
pub const PREFIX_FILE_PATH: &str = ".meta/prefixes.txt";

pub struct HttpRemoteListingClient {
    client: reqwest::Client,
}

impl HttpRemoteListingClient {
    pub fn new(timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    fn listing_url(config: &RepositoryConfig) -> Result<String, DomainError> {
        let base = config.remote_url().ok_or_else(|| {
            DomainError::invalid_input(format!(
                "Proxy repository {} has no remote URL",
                config.id()
            ))
        })?;
        Ok(format!("{}/{}", base.trim_end_matches('/'), PREFIX_FILE_PATH))
    }
}

#[async_trait]
impl RemoteListingClient for HttpRemoteListingClient {
    async fn fetch_listing(&self, config: &RepositoryConfig) -> Result<RemoteListing, DomainError> {
        let url = Self::listing_url(config)?;
        debug!(repository = %config.id(), url = %url, "Probing remote prefix listing");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DomainError::remote_fetch(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if status.is_client_error() {
            // 404-class: the remote does not publish a listing.
            return Ok(RemoteListing::Unsupported);
        }
        if !status.is_success() {
            return Err(DomainError::remote_fetch(format!(
                "GET {} returned {}",
                url, status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DomainError::remote_fetch(format!("Reading {} failed: {}", url, e)))?;

        Ok(RemoteListing::Supported(parse_prefix_file(&body)))
    }
}

/// Parses a prefix listing: one entry per line, `#` comments and blank
/// lines ignored, surrounding whitespace trimmed.
pub fn parse_prefix_file(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prefix_file() {
        let body = "\
## repository-prefixes/2.0
/org/example

/com/acme
  /net/indent
# trailing comment
";
        assert_eq!(
            parse_prefix_file(body),
            vec!["/org/example", "/com/acme", "/net/indent"]
        );
    }

    #[test]
    fn test_listing_url_joins_cleanly() {
        let config = RepositoryConfig::proxy("central", "https://repo1.example.org/maven2/");
        assert_eq!(
            HttpRemoteListingClient::listing_url(&config).expect("url"),
            "https://repo1.example.org/maven2/.meta/prefixes.txt"
        );
    }
}
