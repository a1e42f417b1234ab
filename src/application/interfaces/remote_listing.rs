use async_trait::async_trait;

use crate::domain::{DomainError, RepositoryConfig};

/// Result of probing a proxy repository's remote for its path listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteListing {
    /// The remote publishes a listing; raw entries as served.
    Supported(Vec<String>),
    /// The remote explicitly has no listing (404-class). A stable,
    /// meaningful negative, not an error.
    Unsupported,
}

/// Fetches remote path listings for proxy repositories.
///
/// Transport failures and timeouts surface as `DomainError::RemoteFetch`
/// so callers can distinguish "try again later" from `Unsupported`.
#[async_trait]
pub trait RemoteListingClient: Send + Sync {
    async fn fetch_listing(&self, config: &RepositoryConfig) -> Result<RemoteListing, DomainError>;
}
