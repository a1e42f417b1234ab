use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::application::event_bus::EventBus;
use crate::application::interfaces::{
    ConfigRegistry, LocalCatalog, PredicateStore, RemoteListing, RemoteListingClient,
};
use crate::application::scheduler::ComputeRunner;
use crate::application::use_cases::AggregateGroupUseCase;
use crate::domain::{
    DomainError, PathPredicate, PathSet, PredicateStatus, RepositoryConfig, RepositoryId,
    RepositoryKind, WhitelistEvent,
};

/// Recomputes the whitelist predicate of one repository.
///
/// Hosted repositories enumerate their local catalog, proxies probe the
/// remote listing, groups delegate to the aggregator. Every successful
/// run writes the store and emits exactly one event; a transient fetch
/// failure changes nothing and emits nothing.
pub struct ComputeWhitelistUseCase {
    store: Arc<dyn PredicateStore>,
    registry: Arc<dyn ConfigRegistry>,
    remote: Arc<dyn RemoteListingClient>,
    catalog: Arc<dyn LocalCatalog>,
    bus: Arc<EventBus>,
    aggregator: AggregateGroupUseCase,
    max_prefix_depth: usize,
}

impl ComputeWhitelistUseCase {
    pub fn new(
        store: Arc<dyn PredicateStore>,
        registry: Arc<dyn ConfigRegistry>,
        remote: Arc<dyn RemoteListingClient>,
        catalog: Arc<dyn LocalCatalog>,
        bus: Arc<EventBus>,
        max_prefix_depth: usize,
    ) -> Self {
        let aggregator = AggregateGroupUseCase::new(store.clone(), registry.clone());
        Self {
            store,
            registry,
            remote,
            catalog,
            bus,
            aggregator,
            max_prefix_depth,
        }
    }

    pub async fn execute(&self, id: &RepositoryId) -> Result<(), DomainError> {
        let Some(config) = self.registry.find(id).await? else {
            return self.retire(id).await;
        };

        // A transient proxy fetch failure propagates as an error here,
        // before any store write: the prior predicate stays untouched and
        // no event fires. The next trigger retries naturally.
        let predicate = match config.kind() {
            RepositoryKind::Hosted => self.compute_hosted(id).await?,
            RepositoryKind::Proxy => self.compute_proxy(&config).await?,
            RepositoryKind::Group => self.aggregator.execute(&config).await?,
        };

        self.store.put(id, &predicate).await?;
        self.emit(id, &predicate);
        Ok(())
    }

    async fn compute_hosted(&self, id: &RepositoryId) -> Result<PathPredicate, DomainError> {
        let paths = self.catalog.enumerate(id).await?;
        let entries = PathSet::from_paths(&paths, self.max_prefix_depth);
        debug!(
            repository = %id,
            paths = paths.len(),
            prefixes = entries.len(),
            "Derived hosted whitelist from local catalog"
        );
        Ok(PathPredicate::available(entries))
    }

    async fn compute_proxy(
        &self,
        config: &RepositoryConfig,
    ) -> Result<PathPredicate, DomainError> {
        match self.remote.fetch_listing(config).await? {
            RemoteListing::Supported(raw_entries) => {
                let entries = PathSet::from_paths(&raw_entries, self.max_prefix_depth);
                debug!(
                    repository = %config.id(),
                    prefixes = entries.len(),
                    "Remote listing fetched"
                );
                Ok(PathPredicate::available(entries))
            }
            RemoteListing::Unsupported => {
                debug!(repository = %config.id(), "Remote does not publish a listing");
                Ok(PathPredicate::unavailable())
            }
        }
    }

    /// The registry no longer knows this id: the repository was deleted.
    /// Drop the stored predicate and tell subscribers.
    async fn retire(&self, id: &RepositoryId) -> Result<(), DomainError> {
        info!(repository = %id, "Repository gone from configuration, retiring whitelist");
        self.store.remove(id).await?;
        self.bus.publish(&WhitelistEvent::Unpublished(id.clone()));
        Ok(())
    }

    fn emit(&self, id: &RepositoryId, predicate: &PathPredicate) {
        let event = match predicate.status() {
            PredicateStatus::Available => WhitelistEvent::Published(id.clone()),
            _ => WhitelistEvent::Unpublished(id.clone()),
        };
        self.bus.publish(&event);
    }
}

#[async_trait]
impl ComputeRunner for ComputeWhitelistUseCase {
    async fn run(&self, id: &RepositoryId) -> Result<(), DomainError> {
        self.execute(id).await
    }
}
