//! Tag catalog objects: categories, tags and tag assignments.

use serde::{Deserialize, Serialize};

use super::id::{CategoryId, HostId, TagId};

/// Category holding the release-name tags when the caller names none.
pub const DEFAULT_CATEGORY: &str = "tc_esxi_release_names";

/// Tag applied to hosts whose build has no catalog entry.
pub const DEFAULT_SENTINEL_TAG: &str = "no_matching_release";

/// How many tags of one category an entity may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    Single,
    Multiple,
}

/// Entity types a category can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Host,
}

/// Attributes for a category that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySpec {
    pub name: String,
    pub description: String,
    pub cardinality: Cardinality,
    pub applies_to: EntityType,
}

impl CategorySpec {
    /// A single-valued category applicable to hosts.
    pub fn single_host(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            cardinality: Cardinality::Single,
            applies_to: EntityType::Host,
        }
    }
}

/// A tag category as stored by the tag service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCategory {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub cardinality: Cardinality,
}

/// A tag as stored by the tag service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub category_id: CategoryId,
    pub description: String,
}

/// A `(tag, host)` relation scoped to the tag's category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagAssignment {
    pub tag: Tag,
    pub host: HostId,
}

impl TagAssignment {
    #[must_use]
    pub const fn category_id(&self) -> &CategoryId {
        &self.tag.category_id
    }
}
