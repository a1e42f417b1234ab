use serde::{Deserialize, Serialize};

use super::RepositoryId;

/// Notification that a repository's predicate became available or
/// unavailable.
///
/// Carries only the id: subscribers re-read the current predicate from
/// the store, which avoids stale-payload races. Delivery is at-least-once
/// with no replay; events for the same repository reach a given
/// subscriber in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "repository")]
pub enum WhitelistEvent {
    Published(RepositoryId),
    Unpublished(RepositoryId),
}

impl WhitelistEvent {
    pub fn repository_id(&self) -> &RepositoryId {
        match self {
            WhitelistEvent::Published(id) | WhitelistEvent::Unpublished(id) => id,
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, WhitelistEvent::Published(_))
    }
}
