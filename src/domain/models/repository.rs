use serde::{Deserialize, Serialize};
use tracing::warn;

/// Opaque, stable identifier of a repository (hosted, proxy or group).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepositoryId(String);

impl RepositoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RepositoryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// How a repository sources its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryKind {
    /// Artifacts stored locally; the whitelist comes from the local catalog.
    #[default]
    Hosted,
    /// Fronts a remote; the whitelist comes from the remote prefix listing.
    Proxy,
    /// Aggregates members; the whitelist is the union of the members'.
    Group,
}

impl RepositoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepositoryKind::Hosted => "hosted",
            RepositoryKind::Proxy => "proxy",
            RepositoryKind::Group => "group",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "hosted" => RepositoryKind::Hosted,
            "proxy" => RepositoryKind::Proxy,
            "group" => RepositoryKind::Group,
            unknown => {
                warn!("Unknown repository kind '{}', defaulting to hosted", unknown);
                RepositoryKind::Hosted
            }
        }
    }
}

/// Configuration record of one repository, as served by the configuration
/// registry. Owned by the configuration subsystem; read-only for this crate
/// and re-read on every recompute rather than cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    id: RepositoryId,
    kind: RepositoryKind,
    /// Remote base URL; proxy repositories only.
    remote_url: Option<String>,
    /// Ordered member ids; group repositories only.
    members: Vec<RepositoryId>,
}

impl RepositoryConfig {
    pub fn hosted(id: impl Into<RepositoryId>) -> Self {
        Self {
            id: id.into(),
            kind: RepositoryKind::Hosted,
            remote_url: None,
            members: Vec::new(),
        }
    }

    pub fn proxy(id: impl Into<RepositoryId>, remote_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: RepositoryKind::Proxy,
            remote_url: Some(remote_url.into()),
            members: Vec::new(),
        }
    }

    pub fn group(id: impl Into<RepositoryId>, members: Vec<RepositoryId>) -> Self {
        Self {
            id: id.into(),
            kind: RepositoryKind::Group,
            remote_url: None,
            members,
        }
    }

    pub fn id(&self) -> &RepositoryId {
        &self.id
    }

    pub fn kind(&self) -> RepositoryKind {
        self.kind
    }

    pub fn remote_url(&self) -> Option<&str> {
        self.remote_url.as_deref()
    }

    pub fn members(&self) -> &[RepositoryId] {
        &self.members
    }

    pub fn is_group(&self) -> bool {
        self.kind == RepositoryKind::Group
    }

    pub fn has_member(&self, id: &RepositoryId) -> bool {
        self.members.contains(id)
    }

    pub fn set_members(&mut self, members: Vec<RepositoryId>) {
        self.members = members;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            RepositoryKind::Hosted,
            RepositoryKind::Proxy,
            RepositoryKind::Group,
        ] {
            assert_eq!(RepositoryKind::from_str(kind.as_str()), kind);
        }
    }

    #[test]
    fn test_unknown_kind_defaults_to_hosted() {
        assert_eq!(RepositoryKind::from_str("virtual"), RepositoryKind::Hosted);
    }

    #[test]
    fn test_group_membership() {
        let group = RepositoryConfig::group(
            "releases",
            vec![RepositoryId::from("central"), RepositoryId::from("snapshots")],
        );

        assert!(group.is_group());
        assert!(group.has_member(&RepositoryId::from("central")));
        assert!(!group.has_member(&RepositoryId::from("thirdparty")));
    }
}
