use async_trait::async_trait;

use crate::domain::{DomainError, PathPredicate, RepositoryId};

/// Owns every stored predicate.
///
/// Writes for the same id are serialized upstream by the scheduler's
/// at-most-one-in-flight rule, so implementations only need per-key
/// atomicity, not cross-key locking. Durable implementations are
/// advisory: a stale record after a cold restart is corrected by the
/// next background refresh.
#[async_trait]
pub trait PredicateStore: Send + Sync {
    /// Never blocks on recomputation; absent ids read as `UNKNOWN`.
    async fn get(&self, id: &RepositoryId) -> Result<PathPredicate, DomainError>;

    /// Atomic replace of the record for `id`.
    async fn put(&self, id: &RepositoryId, predicate: &PathPredicate) -> Result<(), DomainError>;

    async fn remove(&self, id: &RepositoryId) -> Result<(), DomainError>;

    async fn list(&self) -> Result<Vec<(RepositoryId, PathPredicate)>, DomainError>;
}
