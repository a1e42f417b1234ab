use async_trait::async_trait;

use crate::domain::{DomainError, RepositoryId};

/// Enumerates the locally stored content of a hosted repository.
#[async_trait]
pub trait LocalCatalog: Send + Sync {
    /// Paths of all artifacts currently stored under `id`, relative to
    /// the repository root.
    async fn enumerate(&self, id: &RepositoryId) -> Result<Vec<String>, DomainError>;
}
