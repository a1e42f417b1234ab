//! JSON topology file loader for the CLI.
//!
//! The file is a list of repository records:
//!
//! ```json
//! [
//!   { "id": "central", "kind": "proxy", "remote_url": "https://repo1.example.org" },
//!   { "id": "internal", "kind": "hosted" },
//!   { "id": "public", "kind": "group", "members": ["central", "internal"] }
//! ]
//! ```
//!
//! Validation happens here, at the boundary: member references must
//! resolve and the member graph must be acyclic. The core assumes both.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::connector::registry::InMemoryConfigRegistry;
use crate::domain::{DomainError, RepositoryConfig, RepositoryId, RepositoryKind};

#[derive(Debug, Deserialize)]
struct RepositoryRecord {
    id: String,
    kind: String,
    #[serde(default)]
    remote_url: Option<String>,
    #[serde(default)]
    members: Vec<String>,
}

/// Loads and validates a topology file into an in-memory registry.
pub fn load_topology(path: &Path) -> Result<InMemoryConfigRegistry, DomainError> {
    let bytes = std::fs::read(path)
        .map_err(|e| DomainError::invalid_input(format!("Cannot read {}: {}", path.display(), e)))?;
    let records: Vec<RepositoryRecord> = serde_json::from_slice(&bytes)
        .map_err(|e| DomainError::invalid_input(format!("Malformed topology file: {}", e)))?;

    let configs = build_configs(records)?;
    Ok(InMemoryConfigRegistry::with_repositories(configs))
}

fn build_configs(records: Vec<RepositoryRecord>) -> Result<Vec<RepositoryConfig>, DomainError> {
    let mut configs = Vec::with_capacity(records.len());
    let mut seen = HashSet::new();

    for record in records {
        if !seen.insert(record.id.clone()) {
            return Err(DomainError::invalid_input(format!(
                "Duplicate repository id: {}",
                record.id
            )));
        }

        let config = match RepositoryKind::from_str(&record.kind) {
            RepositoryKind::Hosted => RepositoryConfig::hosted(record.id.as_str()),
            RepositoryKind::Proxy => {
                let remote_url = record.remote_url.ok_or_else(|| {
                    DomainError::invalid_input(format!(
                        "Proxy repository {} has no remote_url",
                        record.id
                    ))
                })?;
                RepositoryConfig::proxy(record.id.as_str(), remote_url)
            }
            RepositoryKind::Group => RepositoryConfig::group(
                record.id.as_str(),
                record.members.iter().map(|m| RepositoryId::from(m.as_str())).collect(),
            ),
        };
        configs.push(config);
    }

    validate_members(&configs)?;
    Ok(configs)
}

fn validate_members(configs: &[RepositoryConfig]) -> Result<(), DomainError> {
    let by_id: HashMap<&RepositoryId, &RepositoryConfig> =
        configs.iter().map(|c| (c.id(), c)).collect();

    for config in configs.iter().filter(|c| c.is_group()) {
        for member in config.members() {
            if !by_id.contains_key(member) {
                return Err(DomainError::invalid_input(format!(
                    "Group {} references unknown member {}",
                    config.id(),
                    member
                )));
            }
        }
        let mut visiting = HashSet::new();
        if has_cycle(config.id(), &by_id, &mut visiting) {
            return Err(DomainError::invalid_input(format!(
                "Group {} directly or transitively contains itself",
                config.id()
            )));
        }
    }
    Ok(())
}

fn has_cycle<'a>(
    id: &'a RepositoryId,
    by_id: &HashMap<&RepositoryId, &'a RepositoryConfig>,
    visiting: &mut HashSet<&'a RepositoryId>,
) -> bool {
    if !visiting.insert(id) {
        return true;
    }
    let mut cyclic = false;
    if let Some(config) = by_id.get(id) {
        for member in config.members() {
            if has_cycle(member, by_id, visiting) {
                cyclic = true;
                break;
            }
        }
    }
    visiting.remove(id);
    cyclic
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, kind: &str, remote_url: Option<&str>, members: &[&str]) -> RepositoryRecord {
        RepositoryRecord {
            id: id.to_string(),
            kind: kind.to_string(),
            remote_url: remote_url.map(String::from),
            members: members.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[test]
    fn test_builds_valid_topology() {
        let configs = build_configs(vec![
            record("central", "proxy", Some("https://repo1.example.org"), &[]),
            record("internal", "hosted", None, &[]),
            record("public", "group", None, &["central", "internal"]),
        ])
        .expect("valid topology rejected");

        assert_eq!(configs.len(), 3);
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let result = build_configs(vec![
            record("central", "hosted", None, &[]),
            record("central", "hosted", None, &[]),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_proxy_without_remote() {
        let result = build_configs(vec![record("central", "proxy", None, &[])]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_unknown_member() {
        let result = build_configs(vec![record("public", "group", None, &["ghost"])]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_member_cycle() {
        let result = build_configs(vec![
            record("a", "group", None, &["b"]),
            record("b", "group", None, &["a"]),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_accepts_nested_groups() {
        let result = build_configs(vec![
            record("inner", "group", None, &["hosted1"]),
            record("outer", "group", None, &["inner"]),
            record("hosted1", "hosted", None, &[]),
        ]);
        assert!(result.is_ok());
    }
}
