//! Application services (use cases).
//!
//! These services orchestrate domain logic and coordinate adapters
//! to implement the application's use cases.

pub mod reconcile;

pub use reconcile::{
    distinct_builds, ReconcileRequest, ReconcileSettings, Reconciler, DEFAULT_CATALOG_URL,
};
