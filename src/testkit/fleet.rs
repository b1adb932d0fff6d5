//! In-memory fleet implementing every port except [`CatalogSource`].
//!
//! [`MemoryFleet`] keeps hosts, categories, tags and assignments behind a
//! mutex and records every mutating call, so tests can assert on ordering
//! (remove before add) and on the final tag state.
//!
//! [`CatalogSource`]: crate::port::CatalogSource

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{
    BuildUnreadable, Cardinality, CategoryId, CategorySpec, ConnectionState, EntityRef, Host,
    HostId, Tag, TagAssignment, TagCategory, TagId,
};
use crate::error::{Error, Result};
use crate::port::{InventoryProvider, Session, TagService};

/// A mutating call observed by the fleet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FleetCall {
    CreateCategory(String),
    CreateTag(String),
    Attach { host: String, tag: String },
    Detach { host: String, tag: String },
}

#[derive(Debug, Default)]
struct FleetState {
    connected: bool,
    hosts: Vec<(Host, Vec<EntityRef>)>,
    categories: Vec<TagCategory>,
    tags: Vec<Tag>,
    assignments: Vec<(TagId, HostId)>,
    next_id: u64,
    calls: Vec<FleetCall>,
    /// Highest number of tags of one category a host ever held at once.
    peak_per_category: usize,
    fail_attach: HashSet<HostId>,
    fail_detach: HashSet<HostId>,
    fail_tag_create: HashSet<String>,
    fail_category_create: bool,
}

impl FleetState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn tag(&self, id: &TagId) -> Option<&Tag> {
        self.tags.iter().find(|t| &t.id == id)
    }

    fn held_in_category(&self, host: &HostId, category: &CategoryId) -> usize {
        self.assignments
            .iter()
            .filter(|(tag, h)| {
                h == host && self.tag(tag).is_some_and(|t| &t.category_id == category)
            })
            .count()
    }
}

/// Shared in-memory stand-in for the management endpoint.
///
/// Clones share state.
#[derive(Debug, Clone)]
pub struct MemoryFleet {
    state: Arc<Mutex<FleetState>>,
}

impl Default for MemoryFleet {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFleet {
    /// A connected fleet with no hosts.
    pub fn new() -> Self {
        let state = FleetState {
            connected: true,
            ..FleetState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.state.lock().connected = connected;
    }

    /// Add a host outside of any scope.
    pub fn add_host(&self, id: &str, build: &str, state: ConnectionState) {
        self.add_host_in(id, build, state, Vec::new());
    }

    /// Add a host that belongs to the given scopes.
    pub fn add_host_in(
        &self,
        id: &str,
        build: &str,
        state: ConnectionState,
        scopes: Vec<EntityRef>,
    ) {
        let host = Host::new(HostId::from(id), id, build, state);
        self.state.lock().hosts.push((host, scopes));
    }

    /// Add a connected host whose build lookup failed with `status`.
    pub fn add_host_with_unreadable_build(&self, id: &str, status: u16) {
        let host = Host::with_unreadable_build(
            HostId::from(id),
            id,
            BuildUnreadable {
                reason: "software lookup failed".into(),
                status: Some(status),
            },
            ConnectionState::Connected,
        );
        self.state.lock().hosts.push((host, Vec::new()));
    }

    /// Change the build a host reports.
    pub fn set_build(&self, id: &str, build: &str) {
        let mut state = self.state.lock();
        if let Some((host, _)) = state.hosts.iter_mut().find(|(h, _)| h.id().as_str() == id) {
            *host = Host::new(
                host.id().clone(),
                host.name(),
                build,
                host.connection_state().clone(),
            );
        }
    }

    /// Seed an existing category, returning it.
    pub fn seed_category(&self, name: &str) -> TagCategory {
        let mut state = self.state.lock();
        let category = TagCategory {
            id: CategoryId::new(state.next_id("category")),
            name: name.to_string(),
            description: String::new(),
            cardinality: Cardinality::Single,
        };
        state.categories.push(category.clone());
        category
    }

    /// Seed an existing tag, returning it.
    pub fn seed_tag(&self, name: &str, category: &TagCategory) -> Tag {
        let mut state = self.state.lock();
        let tag = Tag {
            id: TagId::new(state.next_id("tag")),
            name: name.to_string(),
            category_id: category.id.clone(),
            description: String::new(),
        };
        state.tags.push(tag.clone());
        tag
    }

    /// Seed an assignment without recording a call.
    pub fn seed_assignment(&self, tag: &Tag, host: &str) {
        self.state
            .lock()
            .assignments
            .push((tag.id.clone(), HostId::from(host)));
    }

    /// Make every attach for `host` fail.
    pub fn fail_attach_for(&self, host: &str) {
        self.state.lock().fail_attach.insert(HostId::from(host));
    }

    /// Make every detach for `host` fail.
    pub fn fail_detach_for(&self, host: &str) {
        self.state.lock().fail_detach.insert(HostId::from(host));
    }

    /// Make creating a tag called `name` fail.
    pub fn fail_tag_create(&self, name: &str) {
        self.state.lock().fail_tag_create.insert(name.to_string());
    }

    pub fn fail_category_create(&self) {
        self.state.lock().fail_category_create = true;
    }

    pub fn category_names(&self) -> Vec<String> {
        self.state
            .lock()
            .categories
            .iter()
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn tag_names(&self) -> Vec<String> {
        self.state.lock().tags.iter().map(|t| t.name.clone()).collect()
    }

    pub fn tag_named(&self, name: &str) -> Option<Tag> {
        self.state.lock().tags.iter().find(|t| t.name == name).cloned()
    }

    /// Names of every tag currently assigned to `host`, in any category.
    pub fn assigned_tags(&self, host: &str) -> Vec<String> {
        let state = self.state.lock();
        state
            .assignments
            .iter()
            .filter(|(_, h)| h.as_str() == host)
            .filter_map(|(tag, _)| state.tag(tag).map(|t| t.name.clone()))
            .collect()
    }

    pub fn calls(&self) -> Vec<FleetCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Highest count of same-category tags any host held at one time.
    pub fn peak_per_category(&self) -> usize {
        self.state.lock().peak_per_category
    }

    /// Tag state as sorted `(host, tags)` pairs, for before/after comparisons.
    pub fn snapshot(&self) -> Vec<(String, Vec<String>)> {
        let hosts: Vec<String> = self
            .state
            .lock()
            .hosts
            .iter()
            .map(|(h, _)| h.id().to_string())
            .collect();
        let mut snapshot: Vec<(String, Vec<String>)> = hosts
            .into_iter()
            .map(|id| {
                let mut tags = self.assigned_tags(&id);
                tags.sort();
                (id, tags)
            })
            .collect();
        snapshot.sort();
        snapshot
    }
}

#[async_trait]
impl Session for MemoryFleet {
    async fn is_active(&self) -> Result<bool> {
        Ok(self.state.lock().connected)
    }

    fn endpoint(&self) -> String {
        "memory".to_string()
    }
}

#[async_trait]
impl InventoryProvider for MemoryFleet {
    async fn list_hosts(&self, scope: Option<&EntityRef>) -> Result<Vec<Host>> {
        let state = self.state.lock();
        Ok(state
            .hosts
            .iter()
            .filter(|(_, scopes)| scope.map_or(true, |s| scopes.contains(s)))
            .map(|(h, _)| h.clone())
            .collect())
    }
}

#[async_trait]
impl TagService for MemoryFleet {
    async fn get_category(&self, name: &str) -> Result<Option<TagCategory>> {
        let state = self.state.lock();
        Ok(state.categories.iter().find(|c| c.name == name).cloned())
    }

    async fn create_category(&self, spec: &CategorySpec) -> Result<TagCategory> {
        let mut state = self.state.lock();
        if state.fail_category_create {
            return Err(Error::TagService {
                operation: "create category",
                status: Some(500),
                message: "injected failure".into(),
            });
        }
        if state.categories.iter().any(|c| c.name == spec.name) {
            return Err(Error::tag_service("create category", "already exists"));
        }
        let category = TagCategory {
            id: CategoryId::new(state.next_id("category")),
            name: spec.name.clone(),
            description: spec.description.clone(),
            cardinality: spec.cardinality,
        };
        state.categories.push(category.clone());
        state.calls.push(FleetCall::CreateCategory(spec.name.clone()));
        Ok(category)
    }

    async fn get_tag(&self, name: &str) -> Result<Option<Tag>> {
        let state = self.state.lock();
        Ok(state.tags.iter().find(|t| t.name == name).cloned())
    }

    async fn create_tag(
        &self,
        name: &str,
        category: &TagCategory,
        description: &str,
    ) -> Result<Tag> {
        let mut state = self.state.lock();
        if state.fail_tag_create.contains(name) {
            return Err(Error::TagService {
                operation: "create tag",
                status: Some(500),
                message: "injected failure".into(),
            });
        }
        if state
            .tags
            .iter()
            .any(|t| t.name == name && t.category_id == category.id)
        {
            return Err(Error::tag_service("create tag", "already exists"));
        }
        let tag = Tag {
            id: TagId::new(state.next_id("tag")),
            name: name.to_string(),
            category_id: category.id.clone(),
            description: description.to_string(),
        };
        state.tags.push(tag.clone());
        state.calls.push(FleetCall::CreateTag(name.to_string()));
        Ok(tag)
    }

    async fn get_assignment(
        &self,
        category: &TagCategory,
        host: &HostId,
    ) -> Result<Option<TagAssignment>> {
        let state = self.state.lock();
        Ok(state
            .assignments
            .iter()
            .filter(|(_, h)| h == host)
            .filter_map(|(tag, _)| state.tag(tag))
            .find(|t| t.category_id == category.id)
            .map(|tag| TagAssignment {
                tag: tag.clone(),
                host: host.clone(),
            }))
    }

    async fn create_assignment(&self, tag: &Tag, host: &HostId) -> Result<TagAssignment> {
        let mut state = self.state.lock();
        if state.fail_attach.contains(host) {
            return Err(Error::TagService {
                operation: "attach",
                status: Some(403),
                message: format!("injected failure for {host}"),
            });
        }
        state.assignments.push((tag.id.clone(), host.clone()));
        let held = state.held_in_category(host, &tag.category_id);
        state.peak_per_category = state.peak_per_category.max(held);
        state.calls.push(FleetCall::Attach {
            host: host.to_string(),
            tag: tag.name.clone(),
        });
        Ok(TagAssignment {
            tag: tag.clone(),
            host: host.clone(),
        })
    }

    async fn remove_assignment(&self, assignment: &TagAssignment) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_detach.contains(&assignment.host) {
            return Err(Error::TagService {
                operation: "detach",
                status: Some(403),
                message: format!("injected failure for {}", assignment.host),
            });
        }
        let before = state.assignments.len();
        state
            .assignments
            .retain(|(tag, host)| !(tag == &assignment.tag.id && host == &assignment.host));
        if state.assignments.len() == before {
            return Err(Error::TagService {
                operation: "detach",
                status: Some(404),
                message: format!(
                    "{} is not attached to {}",
                    assignment.tag.name, assignment.host
                ),
            });
        }
        state.calls.push(FleetCall::Detach {
            host: assignment.host.to_string(),
            tag: assignment.tag.name.clone(),
        });
        Ok(())
    }
}
