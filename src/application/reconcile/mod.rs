//! Release-name reconciliation.
//!
//! A run moves through fixed stages:
//!
//! 1. **Preflight**: the session must be active
//! 2. **Catalog**: load the build to release catalog
//! 3. **Hosts**: list hosts in scope, drop disconnected ones
//! 4. **Builds**: collect the distinct builds among remaining hosts
//! 5. **Catalog objects**: ensure the category, sentinel tag and one tag per
//!    mapped release exist
//! 6. **Apply**: per host, remove the current assignment in the category and
//!    attach the release tag (or the sentinel tag). A host whose build could
//!    not be read is left as it is and recorded as failed
//!
//! Failures in stages 1-5 abort the run before any assignment changes.
//! Failures in stage 6 are recorded per host and the run carries on.
//!
//! # Modules
//!
//! - `objects`: idempotent category/tag creation and build mapping
//! - `apply`: per-host remove-then-add

mod apply;
mod objects;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::domain::{
    EntityRef, Host, HostId, Location, ReconcileReport, RunStage, DEFAULT_CATEGORY,
    DEFAULT_SENTINEL_TAG,
};
use crate::error::{Error, Result};
use crate::port::{CatalogSource, InventoryProvider, Session, TagService};

/// Catalog fetched when a run names no location.
pub const DEFAULT_CATALOG_URL: &str =
    "https://raw.githubusercontent.com/dominikzorgnotti/vmware_product_releases_machine-readable/main/index/kb2143832_vmware_esxi_build_numbers.json";

/// Settings that stay fixed across runs of one reconciler.
#[derive(Debug, Clone)]
pub struct ReconcileSettings {
    /// Catalog location used when a request names none.
    pub default_catalog: String,
    /// Name of the tag applied to hosts with unknown builds.
    pub sentinel_tag: String,
    /// Description given to the category when it is created.
    pub category_description: String,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            default_catalog: DEFAULT_CATALOG_URL.to_string(),
            sentinel_tag: DEFAULT_SENTINEL_TAG.to_string(),
            category_description: "ESXi release names derived from host build numbers"
                .to_string(),
        }
    }
}

/// Parameters for one run.
#[derive(Debug, Clone)]
pub struct ReconcileRequest {
    /// Catalog file path or URL; the settings default when `None`.
    pub catalog: Option<String>,
    pub category: String,
    pub scope: Option<EntityRef>,
    /// Upper bound for the whole run. Unbounded when `None`.
    pub timeout: Option<Duration>,
}

impl Default for ReconcileRequest {
    fn default() -> Self {
        Self {
            catalog: None,
            category: DEFAULT_CATEGORY.to_string(),
            scope: None,
            timeout: None,
        }
    }
}

/// Drives a reconciliation run against the injected collaborators.
///
/// Runs are sequential: every external call is awaited before the next
/// one starts. Concurrent runs against the same category are not safe
/// and must be serialized by the caller.
pub struct Reconciler {
    session: Arc<dyn Session>,
    inventory: Arc<dyn InventoryProvider>,
    tags: Arc<dyn TagService>,
    catalog: Arc<dyn CatalogSource>,
    settings: ReconcileSettings,
    stage: RunStage,
    /// Last non-terminal stage the current run reached.
    reached: RunStage,
}

impl Reconciler {
    pub fn new(
        session: Arc<dyn Session>,
        inventory: Arc<dyn InventoryProvider>,
        tags: Arc<dyn TagService>,
        catalog: Arc<dyn CatalogSource>,
        settings: ReconcileSettings,
    ) -> Self {
        Self {
            session,
            inventory,
            tags,
            catalog,
            settings,
            stage: RunStage::Idle,
            reached: RunStage::Idle,
        }
    }

    /// Stage reached by the most recent run.
    #[must_use]
    pub const fn stage(&self) -> RunStage {
        self.stage
    }

    /// Last stage completed before the most recent run finished or aborted.
    ///
    /// `None` when the run never got past [`RunStage::Idle`].
    #[must_use]
    pub fn last_completed(&self) -> Option<RunStage> {
        (self.reached != RunStage::Idle).then_some(self.reached)
    }

    /// Run one reconciliation to completion or abort.
    ///
    /// A returned report may still contain per-host failures; use
    /// [`ReconcileReport::into_result`] to treat those as an error.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] when the session is not active
    /// - [`Error::Catalog`] when the catalog cannot be loaded
    /// - [`Error::EmptyHostSet`] when no connected host is in scope
    /// - [`Error::TagService`] when the category or sentinel tag cannot be ensured
    /// - [`Error::Timeout`] when the request's timeout expires
    pub async fn run(&mut self, request: &ReconcileRequest) -> Result<ReconcileReport> {
        self.stage = RunStage::Idle;
        self.reached = RunStage::Idle;

        let outcome = match request.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.execute(request)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(Error::Timeout {
                    secs: limit.as_secs(),
                }),
            },
            None => self.execute(request).await,
        };

        if let Err(err) = &outcome {
            warn!(stage = %self.stage, error = %err, "Reconciliation aborted");
            self.stage = RunStage::Aborted;
        }
        outcome
    }

    async fn execute(&mut self, request: &ReconcileRequest) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::new(&request.category);

        self.preflight().await?;

        let raw_location = request
            .catalog
            .as_deref()
            .unwrap_or(&self.settings.default_catalog);
        let location = Location::classify(raw_location)?;
        let catalog = self.catalog.load(&location).await?;
        self.advance(RunStage::CatalogLoaded);

        let hosts = self.enumerate_hosts(request.scope.as_ref()).await?;
        self.advance(RunStage::HostsEnumerated);

        let builds = distinct_builds(&hosts);
        info!(builds = builds.len(), "Derived build set");

        let objects = objects::ensure(
            self.tags.as_ref(),
            &self.settings,
            &request.category,
            &builds,
            &catalog,
            &mut report,
        )
        .await?;
        for (build, carriers) in hosts_by_build(&hosts) {
            if !objects.mapping.contains(build) {
                report.unmapped_builds.insert(build.to_string(), carriers);
            }
        }
        self.advance(RunStage::CatalogObjectsEnsured);

        for host in &hosts {
            let outcome = apply::apply_host(self.tags.as_ref(), host, &objects).await;
            report.hosts.push(outcome);
        }
        self.advance(RunStage::PerHostApplied);

        info!(
            hosts = report.hosts.len(),
            tagged = report.tagged_count(),
            sentinel = report.sentinel_count(),
            failed = report.failure_count(),
            "Reconciliation finished"
        );
        self.advance(RunStage::Done);
        report.stage = self.stage;
        Ok(report)
    }

    async fn preflight(&mut self) -> Result<()> {
        let endpoint = self.session.endpoint();
        if !self.session.is_active().await? {
            return Err(Error::NotConnected);
        }
        info!(endpoint = %endpoint, "Session active");
        self.advance(RunStage::Preflighted);
        Ok(())
    }

    async fn enumerate_hosts(&self, scope: Option<&EntityRef>) -> Result<Vec<Host>> {
        let listed = self.inventory.list_hosts(scope).await?;
        let total = listed.len();

        let hosts: Vec<Host> = listed.into_iter().filter(|h| !h.is_disconnected()).collect();
        let unreadable = hosts.iter().filter(|h| h.build().is_none()).count();
        info!(
            scope = scope.map(ToString::to_string).unwrap_or_else(|| "all".into()),
            listed = total,
            disconnected = total - hosts.len(),
            unreadable,
            "Enumerated hosts"
        );

        if hosts.is_empty() {
            return Err(Error::EmptyHostSet {
                scope: scope.map(ToString::to_string),
            });
        }
        Ok(hosts)
    }

    fn advance(&mut self, to: RunStage) {
        debug_assert_eq!(self.stage.next(), Some(to));
        info!(stage = %to, "Stage reached");
        self.stage = to;
        if !to.is_terminal() {
            self.reached = to;
        }
    }
}

/// Distinct build identifiers among `hosts`, in sorted order.
///
/// Hosts whose build could not be read contribute nothing.
#[must_use]
pub fn distinct_builds(hosts: &[Host]) -> BTreeSet<String> {
    hosts.iter().filter_map(Host::build).map(str::to_string).collect()
}

fn hosts_by_build(hosts: &[Host]) -> BTreeMap<&str, Vec<HostId>> {
    let mut grouped: BTreeMap<&str, Vec<HostId>> = BTreeMap::new();
    for host in hosts {
        if let Some(build) = host.build() {
            grouped.entry(build).or_default().push(host.id().clone());
        }
    }
    grouped
}
