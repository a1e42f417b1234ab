//! Local catalog over the hosted storage directory.
//!
//! Each hosted repository stores its artifacts under `<root>/<id>/`;
//! enumeration walks that tree and reports file paths relative to the
//! repository root. A missing directory is an empty repository, not an
//! error.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::application::LocalCatalog;
use crate::domain::{DomainError, RepositoryId};

pub struct FsLocalCatalog {
    root: PathBuf,
}

impl FsLocalCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl LocalCatalog for FsLocalCatalog {
    async fn enumerate(&self, id: &RepositoryId) -> Result<Vec<String>, DomainError> {
        let repo_root = self.root.join(id.as_str());
        if !repo_root.is_dir() {
            debug!(repository = %id, "No local storage directory, empty catalog");
            return Ok(Vec::new());
        }

        let id = id.clone();
        let paths = tokio::task::spawn_blocking(move || {
            let mut paths = Vec::new();
            for entry in WalkDir::new(&repo_root) {
                let entry = match entry {
                    Ok(e) => e,
                    Err(e) => {
                        warn!(repository = %id, error = %e, "Skipping unreadable catalog entry");
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                if let Ok(relative) = entry.path().strip_prefix(&repo_root) {
                    paths.push(relative.to_string_lossy().replace('\\', "/"));
                }
            }
            paths
        })
        .await
        .map_err(|e| DomainError::catalog(format!("Catalog walk failed: {}", e)))?;

        Ok(paths)
    }
}

/// Catalog serving fixed path lists, for tests and development.
#[derive(Default)]
pub struct StaticCatalog {
    paths: std::sync::Mutex<std::collections::HashMap<RepositoryId, Arc<Vec<String>>>>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_paths(&self, id: impl Into<RepositoryId>, paths: Vec<String>) {
        let mut map = self.paths.lock().expect("static catalog lock poisoned");
        map.insert(id.into(), Arc::new(paths));
    }
}

#[async_trait]
impl LocalCatalog for StaticCatalog {
    async fn enumerate(&self, id: &RepositoryId) -> Result<Vec<String>, DomainError> {
        let map = self.paths.lock().expect("static catalog lock poisoned");
        Ok(map.get(id).map(|p| p.as_ref().clone()).unwrap_or_default())
    }
}
