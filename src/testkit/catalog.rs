//! Fixed [`CatalogSource`] for tests that don't touch disk or network.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{Location, ReleaseCatalog, ReleaseDescriptor};
use crate::error::CatalogError;
use crate::port::CatalogSource;

/// Serves one catalog, or fails every load with HTTP 503.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    catalog: Option<ReleaseCatalog>,
    loads: Arc<AtomicU32>,
    last_location: Arc<Mutex<Option<Location>>>,
}

impl StaticCatalog {
    pub fn new(catalog: ReleaseCatalog) -> Self {
        Self {
            catalog: Some(catalog),
            loads: Arc::new(AtomicU32::new(0)),
            last_location: Arc::new(Mutex::new(None)),
        }
    }

    /// Catalog from `(build, version)` pairs.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self::new(ReleaseCatalog::from_descriptors(
            pairs
                .iter()
                .map(|(build, version)| ReleaseDescriptor::new(*version, *build)),
        ))
    }

    /// A source whose every load fails.
    pub fn unavailable() -> Self {
        Self {
            catalog: None,
            ..Self::new(ReleaseCatalog::default())
        }
    }

    pub fn load_count(&self) -> u32 {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn last_location(&self) -> Option<Location> {
        self.last_location.lock().clone()
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn load(&self, location: &Location) -> Result<ReleaseCatalog, CatalogError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        *self.last_location.lock() = Some(location.clone());
        self.catalog.clone().ok_or_else(|| CatalogError::Status {
            url: location.to_string(),
            status: 503,
        })
    }
}
