//! Scriptable remote-listing client for tests and development.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::application::{RemoteListing, RemoteListingClient};
use crate::domain::{DomainError, RepositoryConfig, RepositoryId};

/// What the mock remote answers for one repository.
#[derive(Debug, Clone)]
pub enum MockRemoteBehavior {
    Supported(Vec<String>),
    Unsupported,
    /// Simulates a network failure or timeout.
    Transient,
}

/// Per-repository scripted remote. Unscripted ids answer `Unsupported`.
#[derive(Default)]
pub struct MockRemoteListingClient {
    behaviors: Mutex<HashMap<RepositoryId, MockRemoteBehavior>>,
}

impl MockRemoteListingClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, id: impl Into<RepositoryId>, behavior: MockRemoteBehavior) {
        let mut behaviors = self.behaviors.lock().expect("mock remote lock poisoned");
        behaviors.insert(id.into(), behavior);
    }
}

#[async_trait]
impl RemoteListingClient for MockRemoteListingClient {
    async fn fetch_listing(&self, config: &RepositoryConfig) -> Result<RemoteListing, DomainError> {
        let behavior = {
            let behaviors = self.behaviors.lock().expect("mock remote lock poisoned");
            behaviors.get(config.id()).cloned()
        };

        match behavior {
            Some(MockRemoteBehavior::Supported(entries)) => Ok(RemoteListing::Supported(entries)),
            Some(MockRemoteBehavior::Unsupported) | None => Ok(RemoteListing::Unsupported),
            Some(MockRemoteBehavior::Transient) => Err(DomainError::remote_fetch(format!(
                "Simulated network failure for {}",
                config.id()
            ))),
        }
    }
}
