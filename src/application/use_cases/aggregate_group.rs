use std::sync::Arc;

use tracing::{debug, warn};

use crate::application::interfaces::{ConfigRegistry, PredicateStore};
use crate::domain::{DomainError, PathPredicate, PathSet, RepositoryConfig};

/// Derives a group repository's predicate from its current live members.
///
/// The group predicate is the union of the entries of members whose
/// predicate is AVAILABLE; UNKNOWN and UNAVAILABLE members contribute
/// nothing. The result is always AVAILABLE, even when empty. Predicates
/// are read back from the store, never taken from event payloads, and
/// membership is re-read from the registry on every run.
pub struct AggregateGroupUseCase {
    store: Arc<dyn PredicateStore>,
    registry: Arc<dyn ConfigRegistry>,
}

impl AggregateGroupUseCase {
    pub fn new(store: Arc<dyn PredicateStore>, registry: Arc<dyn ConfigRegistry>) -> Self {
        Self { store, registry }
    }

    pub async fn execute(&self, config: &RepositoryConfig) -> Result<PathPredicate, DomainError> {
        let mut union = PathSet::new();
        let mut contributing = 0usize;

        for member_id in config.members() {
            // A group referencing a vanished member is a configuration
            // inconsistency: skip it and keep aggregating the rest.
            if self.registry.find(member_id).await?.is_none() {
                warn!(
                    group = %config.id(),
                    member = %member_id,
                    "Group references unknown member, skipping"
                );
                continue;
            }

            let predicate = self.store.get(member_id).await?;
            if predicate.status().is_available() {
                union.merge(predicate.entries());
                contributing += 1;
            }
        }

        debug!(
            group = %config.id(),
            members = config.members().len(),
            contributing,
            prefixes = union.len(),
            "Aggregated group whitelist"
        );

        Ok(PathPredicate::available(union))
    }
}
