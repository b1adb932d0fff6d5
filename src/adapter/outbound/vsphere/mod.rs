//! vCenter adapter.
//!
//! One [`VsphereClient`] implements the session, inventory and tagging
//! ports against the vSphere Automation REST API (vSphere 7.0 U2 or later).

mod client;
mod inventory;
mod tagging;
pub mod types;

pub use client::{ConnectOptions, VsphereClient, SESSION_HEADER};
