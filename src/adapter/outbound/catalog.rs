//! Release catalog loader.
//!
//! Reads the catalog from local disk or fetches it over HTTP(S). A local
//! read failure never falls back to the network.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::domain::{Location, ReleaseCatalog};
use crate::error::{CatalogError, Result};
use crate::port::CatalogSource;

type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Options for remote catalog fetches.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Validate the server certificate. Off by default: internal mirrors
    /// commonly serve self-signed certificates.
    pub verify_tls: bool,
    /// Per-request timeout. `None` leaves the transport default.
    pub timeout: Option<Duration>,
}

/// [`CatalogSource`] backed by the local filesystem and `reqwest`.
#[derive(Debug, Clone)]
pub struct CatalogLoader {
    client: Client,
    verify_tls: bool,
}

impl CatalogLoader {
    /// Build a loader with the given fetch options.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(options: FetchOptions) -> Result<Self> {
        let mut builder = Client::builder().danger_accept_invalid_certs(!options.verify_tls);
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            verify_tls: options.verify_tls,
        })
    }

    async fn read_local(&self, path: &Path) -> CatalogResult<ReleaseCatalog> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CatalogError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        ReleaseCatalog::from_json(&path.display().to_string(), &content)
    }

    async fn fetch_remote(&self, url: &url::Url) -> CatalogResult<ReleaseCatalog> {
        if !self.verify_tls && url.scheme() == "https" {
            warn!(url = %url, "TLS certificate validation disabled for catalog fetch");
        }

        let fetch_err = |source| CatalogError::Fetch {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(fetch_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(fetch_err)?;
        debug!(url = %url, bytes = body.len(), "Fetched catalog document");
        ReleaseCatalog::from_json(url.as_str(), &body)
    }
}

#[async_trait]
impl CatalogSource for CatalogLoader {
    async fn load(&self, location: &Location) -> CatalogResult<ReleaseCatalog> {
        info!(location = %location, "Loading release catalog");

        let catalog = match location {
            Location::LocalPath(path) => self.read_local(path).await?,
            Location::RemoteUrl(url) => self.fetch_remote(url).await?,
        };

        info!(entries = catalog.len(), "Release catalog loaded");
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use super::*;

    fn loader() -> CatalogLoader {
        CatalogLoader::new(FetchOptions::default()).unwrap()
    }

    #[tokio::test]
    async fn loads_local_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"B100": {"Version": "7.0 U3"}}"#).unwrap();

        let catalog = loader()
            .load(&Location::LocalPath(file.path().to_path_buf()))
            .await
            .unwrap();

        assert_eq!(catalog.get("B100").unwrap().version(), "7.0 U3");
    }

    #[tokio::test]
    async fn missing_local_file_is_a_read_error() {
        let err = loader()
            .load(&Location::LocalPath(PathBuf::from("/nonexistent/builds.json")))
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::Read { .. }));
    }

    #[tokio::test]
    async fn malformed_local_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();

        let err = loader()
            .load(&Location::LocalPath(file.path().to_path_buf()))
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::Parse { .. }));
    }
}
