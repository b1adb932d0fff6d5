//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports are the seams between the reconciler and the systems it talks to.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │       Reconciler        │
//!                    └───────────┬─────────────┘
//!        ┌───────────────┬───────┴───────┬────────────────┐
//!        ▼               ▼               ▼                ▼
//!   ┌─────────┐    ┌───────────┐   ┌────────────┐   ┌──────────┐
//!   │ Session │    │ Inventory │   │ TagService │   │ Catalog  │
//!   └─────────┘    └───────────┘   └────────────┘   └──────────┘
//! ```
//!
//! # Available Ports
//!
//! - [`Session`] - Connectivity precondition for the management endpoint
//! - [`InventoryProvider`] - Host listing, optionally scoped to a sub-tree
//! - [`TagService`] - Category, tag and assignment CRUD
//! - [`CatalogSource`] - Release catalog loading

mod catalog;
mod inventory;
mod session;
mod tagging;

pub use catalog::CatalogSource;
pub use inventory::InventoryProvider;
pub use session::Session;
pub use tagging::TagService;
