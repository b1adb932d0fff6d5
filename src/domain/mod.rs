//! Provider-agnostic domain types.

pub mod catalog;
pub mod host;
pub mod id;
pub mod location;
pub mod report;
pub mod tag;

pub use catalog::{tag_label, BuildMapping, ReleaseCatalog, ReleaseDescriptor};
pub use host::{BuildUnreadable, ConnectionState, Host};
pub use id::{CategoryId, EntityRef, HostId, ScopeKind, TagId};
pub use location::Location;
pub use report::{HostOutcome, HostResult, ReconcileReport, RunStage};
pub use tag::{
    Cardinality, CategorySpec, EntityType, Tag, TagAssignment, TagCategory, DEFAULT_CATEGORY,
    DEFAULT_SENTINEL_TAG,
};
