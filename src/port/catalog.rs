//! Release catalog port.

use async_trait::async_trait;

use crate::domain::{Location, ReleaseCatalog};
use crate::error::CatalogError;

/// Loads the release catalog. One attempt, no retries.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn load(&self, location: &Location) -> Result<ReleaseCatalog, CatalogError>;
}
