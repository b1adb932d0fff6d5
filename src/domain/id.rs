//! Domain identifier types with proper encapsulation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Host identifier as issued by the inventory provider (e.g. `host-42`).
///
/// The inner String is private to ensure all construction goes through
/// the defined constructors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HostId(String);

impl HostId {
    /// Create a new `HostId` from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the host ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for HostId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for HostId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Tag category identifier assigned by the tag service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryId(String);

impl CategoryId {
    /// Create a new `CategoryId` from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the category ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tag identifier assigned by the tag service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagId(String);

impl TagId {
    /// Create a new `TagId` from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the tag ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of inventory container a scope points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    Cluster,
    Datacenter,
    Folder,
}

impl ScopeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cluster => "cluster",
            Self::Datacenter => "datacenter",
            Self::Folder => "folder",
        }
    }
}

/// Reference to an inventory sub-tree that restricts which hosts are listed.
///
/// Written as `kind:id` on the command line, e.g. `cluster:domain-c8`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    kind: ScopeKind,
    id: String,
}

impl EntityRef {
    pub fn new(kind: ScopeKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn cluster(id: impl Into<String>) -> Self {
        Self::new(ScopeKind::Cluster, id)
    }

    pub fn datacenter(id: impl Into<String>) -> Self {
        Self::new(ScopeKind::Datacenter, id)
    }

    pub fn folder(id: impl Into<String>) -> Self {
        Self::new(ScopeKind::Folder, id)
    }

    #[must_use]
    pub const fn kind(&self) -> ScopeKind {
        self.kind
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.id)
    }
}

impl FromStr for EntityRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| format!("expected <kind>:<id>, got '{s}'"))?;
        let kind = match kind.to_ascii_lowercase().as_str() {
            "cluster" => ScopeKind::Cluster,
            "datacenter" => ScopeKind::Datacenter,
            "folder" => ScopeKind::Folder,
            other => {
                return Err(format!(
                    "unknown scope kind '{other}' (expected cluster, datacenter or folder)"
                ))
            }
        };
        let id = id.trim();
        if id.is_empty() {
            return Err(format!("scope '{s}' has an empty id"));
        }
        Ok(Self::new(kind, id))
    }
}
