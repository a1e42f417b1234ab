use std::sync::Arc;

use crate::application::interfaces::PredicateStore;
use crate::domain::{DomainError, PathPredicate, RepositoryId};

/// Lists every stored predicate, ordered by repository id.
pub struct ListStatusUseCase {
    store: Arc<dyn PredicateStore>,
}

impl ListStatusUseCase {
    pub fn new(store: Arc<dyn PredicateStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self) -> Result<Vec<(RepositoryId, PathPredicate)>, DomainError> {
        let mut entries = self.store.list().await?;
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }
}
