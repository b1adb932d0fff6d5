//! Inventory port.

use async_trait::async_trait;

use crate::domain::{EntityRef, Host};
use crate::error::Result;

/// Source of managed hosts.
#[async_trait]
pub trait InventoryProvider: Send + Sync {
    /// List hosts, all of them when `scope` is `None`.
    ///
    /// Disconnected hosts are returned too; filtering is the caller's job.
    async fn list_hosts(&self, scope: Option<&EntityRef>) -> Result<Vec<Host>>;
}
