//! Assembly and lifecycle of the whitelist subsystem.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::event_bus::EventBus;
use crate::application::interfaces::{
    ConfigRegistry, LocalCatalog, PredicateStore, RemoteListingClient,
};
use crate::application::scheduler::UpdateScheduler;
use crate::application::use_cases::{CheckPathUseCase, ComputeWhitelistUseCase, ListStatusUseCase};
use crate::domain::{DomainError, PathVerdict, RepositoryId};

/// Tunables of the whitelist subsystem.
#[derive(Debug, Clone)]
pub struct WhitelistConfig {
    /// Whitelist entries are truncated to this many path segments.
    pub max_prefix_depth: usize,
    /// Upper bound on parallel compute jobs.
    pub max_concurrent_jobs: usize,
    /// Interval of the full periodic refresh; `None` disables it.
    pub refresh_interval: Option<Duration>,
    /// How long shutdown waits for in-flight jobs.
    pub shutdown_grace: Duration,
}

impl Default for WhitelistConfig {
    fn default() -> Self {
        Self {
            max_prefix_depth: crate::domain::DEFAULT_MAX_PREFIX_DEPTH,
            max_concurrent_jobs: 8,
            refresh_interval: Some(Duration::from_secs(20 * 60)),
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

/// Wires store, registry, remote client, catalog, event bus and scheduler
/// together and runs the background tasks that keep whitelists current:
///
/// - boot: every known repository is enqueued once;
/// - configuration changes: the affected id is enqueued;
/// - member events: the propagator enqueues every group currently
///   containing the publisher (nested groups propagate transitively);
/// - periodic refresh: all ids re-enqueued on a fixed interval.
pub struct WhitelistService {
    store: Arc<dyn PredicateStore>,
    registry: Arc<dyn ConfigRegistry>,
    bus: Arc<EventBus>,
    scheduler: Arc<UpdateScheduler>,
    config: WhitelistConfig,
    tasks: Vec<JoinHandle<()>>,
}

impl WhitelistService {
    pub fn new(
        store: Arc<dyn PredicateStore>,
        registry: Arc<dyn ConfigRegistry>,
        remote: Arc<dyn RemoteListingClient>,
        catalog: Arc<dyn LocalCatalog>,
        config: WhitelistConfig,
    ) -> Self {
        let bus = Arc::new(EventBus::new());
        let compute = Arc::new(ComputeWhitelistUseCase::new(
            store.clone(),
            registry.clone(),
            remote,
            catalog,
            bus.clone(),
            config.max_prefix_depth,
        ));
        let scheduler = Arc::new(UpdateScheduler::new(compute, config.max_concurrent_jobs));

        Self {
            store,
            registry,
            bus,
            scheduler,
            config,
            tasks: Vec::new(),
        }
    }

    /// Enqueues every known repository and spawns the propagator, the
    /// configuration listener and the periodic refresh.
    pub async fn start(&mut self) -> Result<(), DomainError> {
        self.spawn_propagator();
        self.spawn_config_listener();

        let ids = self.known_ids().await?;
        info!(repositories = ids.len(), "Scheduling whitelist updates on boot");
        self.scheduler.enqueue_all(ids);

        if let Some(interval) = self.config.refresh_interval {
            self.spawn_periodic_refresh(interval);
        }
        Ok(())
    }

    /// Member publish/unpublish → re-aggregate every containing group.
    /// Containing groups are looked up in the current configuration at
    /// delivery time, never from a cached subscription table.
    fn spawn_propagator(&mut self) {
        let mut subscription = self.bus.subscribe();
        let registry = self.registry.clone();
        let scheduler = self.scheduler.clone();

        self.tasks.push(tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                let id = event.repository_id();
                match registry.groups_containing(id).await {
                    Ok(groups) => {
                        for group_id in groups {
                            debug!(
                                member = %id,
                                group = %group_id,
                                "Member whitelist changed, re-aggregating group"
                            );
                            scheduler.enqueue(group_id);
                        }
                    }
                    Err(e) => {
                        warn!(repository = %id, error = %e, "Failed to resolve containing groups");
                    }
                }
            }
        }));
    }

    fn spawn_config_listener(&mut self) {
        let mut changes = self.registry.changes();
        let scheduler = self.scheduler.clone();

        self.tasks.push(tokio::spawn(async move {
            while let Some(change) = changes.recv().await {
                let id = change.repository_id().clone();
                debug!(repository = %id, change = ?change, "Configuration changed");
                // Removed ids are enqueued too: the compute job notices
                // the id is gone, retires the predicate and unpublishes.
                scheduler.enqueue(id);
            }
        }));
    }

    fn spawn_periodic_refresh(&mut self, interval: Duration) {
        let registry = self.registry.clone();
        let scheduler = self.scheduler.clone();

        self.tasks.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            ticker.tick().await; // first tick fires immediately, boot already ran
            loop {
                ticker.tick().await;
                match registry.list().await {
                    Ok(configs) => {
                        debug!(repositories = configs.len(), "Periodic whitelist refresh");
                        for config in configs {
                            scheduler.enqueue(config.id().clone());
                        }
                    }
                    Err(e) => warn!(error = %e, "Periodic refresh failed to list repositories"),
                }
            }
        }));
    }

    /// Stops the background tasks and drains in-flight jobs within the
    /// configured grace period.
    pub async fn shutdown(&mut self) {
        self.scheduler.shutdown(self.config.shutdown_grace).await;
        for task in self.tasks.drain(..) {
            task.abort();
        }
        info!("Whitelist service stopped");
    }

    /// Explicit trigger for one repository (operator or collaborator use).
    pub fn trigger(&self, id: RepositoryId) {
        self.scheduler.enqueue(id);
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn check_path(&self) -> CheckPathUseCase {
        CheckPathUseCase::new(self.store.clone())
    }

    pub fn list_status(&self) -> ListStatusUseCase {
        ListStatusUseCase::new(self.store.clone())
    }

    /// Convenience wrapper over `CheckPathUseCase`.
    pub async fn is_known_to_exist(
        &self,
        id: &RepositoryId,
        path: &str,
    ) -> Result<PathVerdict, DomainError> {
        self.check_path().execute(id, path).await
    }

    /// Repository ids with no in-flight or pending compute job.
    pub fn is_settled(&self) -> bool {
        self.scheduler.active_jobs() == 0
    }

    async fn known_ids(&self) -> Result<Vec<RepositoryId>, DomainError> {
        Ok(self
            .registry
            .list()
            .await?
            .into_iter()
            .map(|config| config.id().clone())
            .collect())
    }
}
