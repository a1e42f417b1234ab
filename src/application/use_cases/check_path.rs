use std::sync::Arc;

use crate::application::interfaces::PredicateStore;
use crate::domain::{DomainError, PathVerdict, RepositoryId};

/// Fast existence pre-check used by the request-serving path.
///
/// An `Unknown` verdict means "no information": the caller performs the
/// full remote check instead.
pub struct CheckPathUseCase {
    store: Arc<dyn PredicateStore>,
}

impl CheckPathUseCase {
    pub fn new(store: Arc<dyn PredicateStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, id: &RepositoryId, path: &str) -> Result<PathVerdict, DomainError> {
        let predicate = self.store.get(id).await?;
        Ok(predicate.verdict(path))
    }
}
