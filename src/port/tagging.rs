//! Tag service port.
//!
//! Categories and tags are looked up by name. The service itself does not
//! enforce the one-assignment-per-category rule for hosts; callers do that
//! by removing before adding.

use async_trait::async_trait;

use crate::domain::{CategorySpec, HostId, Tag, TagAssignment, TagCategory};
use crate::error::Result;

/// Category, tag and tag-assignment operations.
#[async_trait]
pub trait TagService: Send + Sync {
    /// Find a category by name.
    async fn get_category(&self, name: &str) -> Result<Option<TagCategory>>;

    /// Create a category. Fails if one with the same name already exists.
    async fn create_category(&self, spec: &CategorySpec) -> Result<TagCategory>;

    /// Find a tag by name, in any category.
    async fn get_tag(&self, name: &str) -> Result<Option<Tag>>;

    /// Create a tag under `category`.
    async fn create_tag(
        &self,
        name: &str,
        category: &TagCategory,
        description: &str,
    ) -> Result<Tag>;

    /// The host's current assignment within `category`, if any.
    async fn get_assignment(
        &self,
        category: &TagCategory,
        host: &HostId,
    ) -> Result<Option<TagAssignment>>;

    /// Attach `tag` to `host`.
    async fn create_assignment(&self, tag: &Tag, host: &HostId) -> Result<TagAssignment>;

    /// Detach an existing assignment.
    async fn remove_assignment(&self, assignment: &TagAssignment) -> Result<()>;
}
