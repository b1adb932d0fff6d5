//! Where a release catalog is read from.

use std::fmt;
use std::path::{Path, PathBuf};

use url::Url;

use crate::error::CatalogError;

/// Catalog location, decided once before loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    LocalPath(PathBuf),
    RemoteUrl(Url),
}

impl Location {
    /// Classify a raw location string.
    ///
    /// Precedence:
    /// 1. an existing local file is always local;
    /// 2. `http`/`https` URLs are remote, `file://` URLs are local, and any
    ///    other scheme is rejected;
    /// 3. something that reads as a filesystem path (leading `/`, `.`, `~`,
    ///    a backslash or a drive letter) stays local and fails to read;
    /// 4. anything else names a network location and is fetched over `http`,
    ///    e.g. `mirror.lab.local/kb2143832.json`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidLocation`] for empty input, unsupported
    /// schemes and strings that do not form a URL.
    pub fn classify(raw: &str) -> Result<Self, CatalogError> {
        let raw = raw.trim();
        let invalid = || CatalogError::InvalidLocation(raw.to_string());
        if raw.is_empty() {
            return Err(invalid());
        }

        let path = Path::new(raw);
        if path.is_file() {
            return Ok(Self::LocalPath(path.to_path_buf()));
        }

        if raw.contains("://") {
            let url = Url::parse(raw).map_err(|_| invalid())?;
            return match url.scheme() {
                "http" | "https" => Ok(Self::RemoteUrl(url)),
                "file" => url.to_file_path().map(Self::LocalPath).map_err(|()| invalid()),
                _ => Err(invalid()),
            };
        }

        if looks_like_path(raw) {
            return Ok(Self::LocalPath(path.to_path_buf()));
        }

        Url::parse(&format!("http://{raw}"))
            .map(Self::RemoteUrl)
            .map_err(|_| invalid())
    }

    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteUrl(_))
    }
}

fn looks_like_path(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    let drive = bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':';
    drive || raw.contains('\\') || raw.starts_with(&['/', '.', '~'][..])
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalPath(path) => write!(f, "{}", path.display()),
            Self::RemoteUrl(url) => write!(f, "{url}"),
        }
    }
}
