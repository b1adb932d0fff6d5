//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`fleet`] - [`MemoryFleet`](fleet::MemoryFleet), an in-memory session,
//!   inventory and tag service with call recording and failure injection.
//! - [`catalog`] - [`StaticCatalog`](catalog::StaticCatalog), a fixed catalog source.

pub mod catalog;
pub mod fleet;

use std::sync::Arc;

use crate::application::{ReconcileSettings, Reconciler};

/// Reconciler wired to `fleet` for every port and `catalog` for the catalog.
pub fn reconciler(fleet: &fleet::MemoryFleet, catalog: &catalog::StaticCatalog) -> Reconciler {
    Reconciler::new(
        Arc::new(fleet.clone()),
        Arc::new(fleet.clone()),
        Arc::new(fleet.clone()),
        Arc::new(catalog.clone()),
        ReconcileSettings::default(),
    )
}
