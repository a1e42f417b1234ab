//! In-memory predicate storage.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::PredicateStore;
use crate::domain::{DomainError, PathPredicate, RepositoryId};

/// In-memory predicate storage for testing and development.
#[derive(Default)]
pub struct InMemoryPredicateStore {
    predicates: Arc<Mutex<HashMap<RepositoryId, PathPredicate>>>,
}

impl InMemoryPredicateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PredicateStore for InMemoryPredicateStore {
    async fn get(&self, id: &RepositoryId) -> Result<PathPredicate, DomainError> {
        let predicates = self.predicates.lock().await;
        Ok(predicates.get(id).cloned().unwrap_or_else(PathPredicate::unknown))
    }

    async fn put(&self, id: &RepositoryId, predicate: &PathPredicate) -> Result<(), DomainError> {
        let mut predicates = self.predicates.lock().await;
        predicates.insert(id.clone(), predicate.clone());
        debug!(repository = %id, status = ?predicate.status(), "Stored predicate");
        Ok(())
    }

    async fn remove(&self, id: &RepositoryId) -> Result<(), DomainError> {
        let mut predicates = self.predicates.lock().await;
        predicates.remove(id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<(RepositoryId, PathPredicate)>, DomainError> {
        let predicates = self.predicates.lock().await;
        Ok(predicates.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}
