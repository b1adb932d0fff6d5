//! Run stages and the report a reconciliation run produces.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::id::HostId;
use crate::error::{Error, Result};

/// Progress of a single reconciliation run.
///
/// Runs move strictly forward through the stages. A fatal failure or an
/// expired timeout lands in [`RunStage::Aborted`] from whichever stage was
/// reached; per-host anomalies do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Idle,
    Preflighted,
    CatalogLoaded,
    HostsEnumerated,
    CatalogObjectsEnsured,
    PerHostApplied,
    Done,
    Aborted,
}

impl RunStage {
    /// The stage that follows this one on the success path.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Preflighted),
            Self::Preflighted => Some(Self::CatalogLoaded),
            Self::CatalogLoaded => Some(Self::HostsEnumerated),
            Self::HostsEnumerated => Some(Self::CatalogObjectsEnsured),
            Self::CatalogObjectsEnsured => Some(Self::PerHostApplied),
            Self::PerHostApplied => Some(Self::Done),
            Self::Done | Self::Aborted => None,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Preflighted => "preflighted",
            Self::CatalogLoaded => "catalog loaded",
            Self::HostsEnumerated => "hosts enumerated",
            Self::CatalogObjectsEnsured => "catalog objects ensured",
            Self::PerHostApplied => "per-host applied",
            Self::Done => "done",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// What happened to one host during the apply phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum HostResult {
    /// Assigned the release tag for its build.
    Tagged { tag: String },
    /// Build has no catalog entry; assigned the sentinel tag.
    Sentinel { tag: String },
    /// Tag service refused one of the steps for this host.
    Failed {
        reason: String,
        status: Option<u16>,
    },
}

/// Per-host line of a [`ReconcileReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostOutcome {
    pub host: HostId,
    pub name: String,
    pub build: String,
    /// Tag that was detached before the new assignment, if any.
    pub removed: Option<String>,
    #[serde(flatten)]
    pub result: HostResult,
}

impl HostOutcome {
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self.result, HostResult::Failed { .. })
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub category: String,
    pub stage: RunStage,
    pub created_category: bool,
    pub created_tags: Vec<String>,
    /// Builds without a catalog entry, with the hosts that report them.
    pub unmapped_builds: BTreeMap<String, Vec<HostId>>,
    pub hosts: Vec<HostOutcome>,
}

impl ReconcileReport {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            stage: RunStage::Idle,
            created_category: false,
            created_tags: Vec::new(),
            unmapped_builds: BTreeMap::new(),
            hosts: Vec::new(),
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &HostOutcome> {
        self.hosts.iter().filter(|h| h.is_failed())
    }

    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    #[must_use]
    pub fn tagged_count(&self) -> usize {
        self.hosts
            .iter()
            .filter(|h| matches!(h.result, HostResult::Tagged { .. }))
            .count()
    }

    #[must_use]
    pub fn sentinel_count(&self) -> usize {
        self.hosts
            .iter()
            .filter(|h| matches!(h.result, HostResult::Sentinel { .. }))
            .count()
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failure_count() == 0
    }

    /// Turn a report with per-host failures into [`Error::HostFailures`].
    ///
    /// # Errors
    ///
    /// Returns an error when at least one host failed.
    pub fn into_result(self) -> Result<Self> {
        let failed = self.failure_count();
        if failed > 0 {
            return Err(Error::HostFailures {
                failed,
                total: self.hosts.len(),
            });
        }
        Ok(self)
    }
}
