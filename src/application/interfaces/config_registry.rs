use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::{DomainError, RepositoryConfig, RepositoryId};

/// A configuration change the whitelist core must react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigChange {
    Added(RepositoryId),
    Updated(RepositoryId),
    /// Membership of a group changed; triggers the group, not its members.
    MembersChanged(RepositoryId),
    Removed(RepositoryId),
}

impl ConfigChange {
    pub fn repository_id(&self) -> &RepositoryId {
        match self {
            ConfigChange::Added(id)
            | ConfigChange::Updated(id)
            | ConfigChange::MembersChanged(id)
            | ConfigChange::Removed(id) => id,
        }
    }
}

/// Read-only view of the repository configuration subsystem.
///
/// Membership and topology are re-read on every recompute rather than
/// cached; the registry is the single source of truth for the member
/// graph, which it keeps acyclic.
#[async_trait]
pub trait ConfigRegistry: Send + Sync {
    async fn list(&self) -> Result<Vec<RepositoryConfig>, DomainError>;

    async fn find(&self, id: &RepositoryId) -> Result<Option<RepositoryConfig>, DomainError>;

    /// Every group whose current member set contains `id`.
    async fn groups_containing(&self, id: &RepositoryId) -> Result<Vec<RepositoryId>, DomainError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|config| config.is_group() && config.has_member(id))
            .map(|config| config.id().clone())
            .collect())
    }

    /// Stream of configuration changes. Each call returns an independent
    /// subscription starting from "now"; there is no replay.
    fn changes(&self) -> mpsc::UnboundedReceiver<ConfigChange>;
}
