//! release-tagger - tag ESXi hosts with the release name of their build.
//!
//! Reads a build-number to release catalog, enumerates the connected hosts
//! of a vCenter, makes sure a single-valued tag category holds one tag per
//! release, and assigns each host exactly one tag in that category: its
//! release, or a sentinel when the build is not in the catalog.
//!
//! # Architecture
//!
//! Hexagonal layout:
//!
//! - [`domain`] - Hosts, catalog entries, tags and the run report
//! - [`port`] - Traits at the external seams (session, inventory, tagging, catalog)
//! - [`application`] - The [`Reconciler`](application::Reconciler)
//! - [`adapter`] - vCenter REST client, catalog loader, CLI
//! - [`infrastructure`] - Configuration and logging
//! - [`error`] - Error types for the crate
//!
//! # Features
//!
//! - `testkit` - In-memory fleet and catalog for integration tests
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use release_tagger::adapter::outbound::catalog::{CatalogLoader, FetchOptions};
//! use release_tagger::adapter::outbound::vsphere::{ConnectOptions, VsphereClient};
//! use release_tagger::application::{ReconcileRequest, ReconcileSettings, Reconciler};
//!
//! # async fn run() -> release_tagger::error::Result<()> {
//! let client = Arc::new(VsphereClient::new(&ConnectOptions {
//!     url: "https://vcenter.lab.local".parse()?,
//!     insecure: false,
//!     timeout: None,
//! })?);
//! client.login("reader@vsphere.local", "secret").await?;
//!
//! let catalog = Arc::new(CatalogLoader::new(FetchOptions::default())?);
//! let mut reconciler = Reconciler::new(
//!     client.clone(),
//!     client.clone(),
//!     client,
//!     catalog,
//!     ReconcileSettings::default(),
//! );
//! let report = reconciler.run(&ReconcileRequest::default()).await?;
//! report.into_result()?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
