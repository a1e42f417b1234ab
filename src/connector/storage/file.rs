//! Durable predicate storage: one JSON record per repository id.
//!
//! Persistence is advisory. A cold restart reads the last computed
//! predicates instead of starting every repository at `UNKNOWN`, which
//! avoids a thundering herd of remote probes on boot; a stale record is
//! corrected by the next background refresh. Corrupt or unreadable
//! records degrade to `UNKNOWN` with a warning.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::application::PredicateStore;
use crate::domain::{DomainError, PathPredicate, RepositoryId};

pub struct FilePredicateStore {
    dir: PathBuf,
}

impl FilePredicateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| DomainError::storage(format!("Failed to create store dir: {}", e)))?;
        Ok(Self { dir })
    }

    fn record_path(&self, id: &RepositoryId) -> PathBuf {
        // Repository ids come from configuration; keep anything that is
        // not filename-safe out of the record name.
        let safe: String = id
            .as_str()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }
}

#[async_trait]
impl PredicateStore for FilePredicateStore {
    async fn get(&self, id: &RepositoryId) -> Result<PathPredicate, DomainError> {
        let path = self.record_path(id);
        match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(predicate) => Ok(predicate),
                Err(e) => {
                    warn!(
                        repository = %id,
                        error = %e,
                        "Corrupt predicate record, treating as unknown"
                    );
                    Ok(PathPredicate::unknown())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PathPredicate::unknown()),
            Err(e) => Err(DomainError::storage(format!(
                "Failed to read predicate record: {}",
                e
            ))),
        }
    }

    async fn put(&self, id: &RepositoryId, predicate: &PathPredicate) -> Result<(), DomainError> {
        let path = self.record_path(id);
        let bytes = serde_json::to_vec_pretty(predicate)
            .map_err(|e| DomainError::storage(format!("Failed to encode predicate: {}", e)))?;

        // Write-then-rename gives per-record atomic replace.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to write predicate record: {}", e)))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to replace predicate record: {}", e)))?;

        debug!(repository = %id, record = %path.display(), "Persisted predicate");
        Ok(())
    }

    async fn remove(&self, id: &RepositoryId) -> Result<(), DomainError> {
        let path = self.record_path(id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DomainError::storage(format!(
                "Failed to remove predicate record: {}",
                e
            ))),
        }
    }

    async fn list(&self) -> Result<Vec<(RepositoryId, PathPredicate)>, DomainError> {
        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to read store dir: {}", e)))?;

        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to read store dir: {}", e)))?
        {
            let path = entry.path();
            let Some(id) = record_id(&path) else {
                continue;
            };
            let id = RepositoryId::new(id);
            let predicate = self.get(&id).await?;
            entries.push((id, predicate));
        }

        Ok(entries)
    }
}

fn record_id(path: &Path) -> Option<String> {
    if path.extension()?.to_str()? != "json" {
        return None;
    }
    Some(path.file_stem()?.to_str()?.to_string())
}
