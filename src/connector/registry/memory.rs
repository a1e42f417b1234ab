//! In-memory repository configuration registry.
//!
//! Stands in for the configuration subsystem: holds the current
//! topology, and pushes a `ConfigChange` to every live change
//! subscription whenever a mutator runs.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use crate::application::{ConfigChange, ConfigRegistry};
use crate::domain::{DomainError, RepositoryConfig, RepositoryId};

#[derive(Default)]
struct RegistryInner {
    repositories: HashMap<RepositoryId, RepositoryConfig>,
    watchers: Vec<mpsc::UnboundedSender<ConfigChange>>,
}

#[derive(Default)]
pub struct InMemoryConfigRegistry {
    inner: Mutex<RegistryInner>,
}

impl InMemoryConfigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repositories(configs: impl IntoIterator<Item = RepositoryConfig>) -> Self {
        let registry = Self::new();
        {
            let mut inner = registry.inner.lock().expect("registry lock poisoned");
            for config in configs {
                inner.repositories.insert(config.id().clone(), config);
            }
        }
        registry
    }

    pub fn add(&self, config: RepositoryConfig) {
        let id = config.id().clone();
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        let change = if inner.repositories.insert(id.clone(), config).is_some() {
            ConfigChange::Updated(id)
        } else {
            ConfigChange::Added(id)
        };
        notify(&mut inner, change);
    }

    pub fn remove(&self, id: &RepositoryId) {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        if inner.repositories.remove(id).is_some() {
            notify(&mut inner, ConfigChange::Removed(id.clone()));
        }
    }

    /// Replaces a group's member set and notifies with `MembersChanged`
    /// for the group id (the group, not its members, gets re-triggered).
    pub fn set_members(
        &self,
        group_id: &RepositoryId,
        members: Vec<RepositoryId>,
    ) -> Result<(), DomainError> {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        let config = inner
            .repositories
            .get_mut(group_id)
            .ok_or_else(|| DomainError::not_found(format!("No such repository: {}", group_id)))?;

        if !config.is_group() {
            return Err(DomainError::invalid_input(format!(
                "Repository {} is not a group",
                group_id
            )));
        }

        config.set_members(members);
        notify(&mut inner, ConfigChange::MembersChanged(group_id.clone()));
        Ok(())
    }
}

fn notify(inner: &mut RegistryInner, change: ConfigChange) {
    debug!(change = ?change, "Configuration registry changed");
    inner.watchers.retain(|tx| tx.send(change.clone()).is_ok());
}

#[async_trait]
impl ConfigRegistry for InMemoryConfigRegistry {
    async fn list(&self) -> Result<Vec<RepositoryConfig>, DomainError> {
        let inner = self.inner.lock().expect("registry lock poisoned");
        Ok(inner.repositories.values().cloned().collect())
    }

    async fn find(&self, id: &RepositoryId) -> Result<Option<RepositoryConfig>, DomainError> {
        let inner = self.inner.lock().expect("registry lock poisoned");
        Ok(inner.repositories.get(id).cloned())
    }

    fn changes(&self) -> mpsc::UnboundedReceiver<ConfigChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        inner.watchers.push(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mutators_notify_watchers() {
        let registry = InMemoryConfigRegistry::new();
        let mut changes = registry.changes();

        registry.add(RepositoryConfig::hosted("central"));
        registry.add(RepositoryConfig::group("all", vec![RepositoryId::from("central")]));
        registry
            .set_members(&RepositoryId::from("all"), vec![])
            .expect("set_members failed");
        registry.remove(&RepositoryId::from("central"));

        assert_eq!(changes.recv().await, Some(ConfigChange::Added(RepositoryId::from("central"))));
        assert_eq!(changes.recv().await, Some(ConfigChange::Added(RepositoryId::from("all"))));
        assert_eq!(
            changes.recv().await,
            Some(ConfigChange::MembersChanged(RepositoryId::from("all")))
        );
        assert_eq!(
            changes.recv().await,
            Some(ConfigChange::Removed(RepositoryId::from("central")))
        );
    }

    #[tokio::test]
    async fn test_groups_containing() {
        let registry = InMemoryConfigRegistry::with_repositories([
            RepositoryConfig::hosted("central"),
            RepositoryConfig::group("all", vec![RepositoryId::from("central")]),
            RepositoryConfig::group("other", vec![RepositoryId::from("thirdparty")]),
        ]);

        let groups = registry
            .groups_containing(&RepositoryId::from("central"))
            .await
            .expect("lookup failed");

        assert_eq!(groups, vec![RepositoryId::from("all")]);
    }

    #[tokio::test]
    async fn test_set_members_rejects_non_groups() {
        let registry = InMemoryConfigRegistry::with_repositories([RepositoryConfig::hosted("central")]);

        let result = registry.set_members(&RepositoryId::from("central"), vec![]);
        assert!(result.is_err());
    }
}
