//! Release catalog and the build mapping derived from it.
//!
//! - [`ReleaseCatalog`] - build identifier to [`ReleaseDescriptor`], loaded once per run
//! - [`BuildMapping`] - build identifier to normalized tag label, restricted to
//!   builds actually present in the fleet
//!
//! The catalog document is a JSON object keyed by build identifier. Each value
//! must be an object carrying a string `Version`; any other fields are kept as-is.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::CatalogError;

/// Field holding the human-readable release name in every catalog entry.
const VERSION_FIELD: &str = "Version";

/// A single catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseDescriptor {
    version: String,
    build: String,
    extra: Map<String, Value>,
}

impl ReleaseDescriptor {
    pub fn new(version: impl Into<String>, build: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            build: build.into(),
            extra: Map::new(),
        }
    }

    /// Release name as published, e.g. `7.0 U3`.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Build identifier this entry is keyed by.
    #[must_use]
    pub fn build(&self) -> &str {
        &self.build
    }

    /// Every other field of the entry, verbatim.
    #[must_use]
    pub const fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Tag label for this release: the version with spaces turned into underscores.
    #[must_use]
    pub fn tag_label(&self) -> String {
        tag_label(&self.version)
    }

    /// Description written onto the release tag when it is created.
    #[must_use]
    pub fn tag_description(&self) -> String {
        format!("{} - build: {}", self.version, self.build)
    }
}

/// Normalize a release version into a tag label.
#[must_use]
pub fn tag_label(version: &str) -> String {
    version.replace(' ', "_")
}

/// Immutable build to release lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReleaseCatalog {
    entries: BTreeMap<String, ReleaseDescriptor>,
}

impl ReleaseCatalog {
    /// Parse a catalog document.
    ///
    /// `location` is only used to label errors.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] when the document is not a JSON object,
    /// an entry is not an object, or an entry lacks a string `Version`.
    pub fn from_json(location: &str, content: &str) -> Result<Self, CatalogError> {
        let parse_err = |reason: String| CatalogError::Parse {
            location: location.to_string(),
            reason,
        };

        let document: Value = serde_json::from_str(content).map_err(|e| parse_err(e.to_string()))?;
        let Value::Object(document) = document else {
            return Err(parse_err("top-level value must be an object".into()));
        };

        let mut entries = BTreeMap::new();
        for (build, value) in document {
            let Value::Object(mut fields) = value else {
                return Err(parse_err(format!("entry '{build}' is not an object")));
            };
            let version = match fields.remove(VERSION_FIELD) {
                Some(Value::String(version)) => version,
                Some(_) => {
                    return Err(parse_err(format!(
                        "entry '{build}' has a non-string {VERSION_FIELD}"
                    )))
                }
                None => {
                    return Err(parse_err(format!(
                        "entry '{build}' is missing {VERSION_FIELD}"
                    )))
                }
            };
            let descriptor = ReleaseDescriptor {
                version,
                build: build.clone(),
                extra: fields,
            };
            entries.insert(build, descriptor);
        }

        Ok(Self { entries })
    }

    /// Build a catalog directly from descriptors.
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = ReleaseDescriptor>) -> Self {
        Self {
            entries: descriptors
                .into_iter()
                .map(|d| (d.build.clone(), d))
                .collect(),
        }
    }

    /// Exact-match lookup of a build identifier.
    #[must_use]
    pub fn get(&self, build: &str) -> Option<&ReleaseDescriptor> {
        self.entries.get(build)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReleaseDescriptor> {
        self.entries.values()
    }
}

/// Build identifier to tag label, derived fresh for every run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildMapping {
    labels: BTreeMap<String, String>,
}

impl BuildMapping {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, build: impl Into<String>, label: impl Into<String>) {
        self.labels.insert(build.into(), label.into());
    }

    #[must_use]
    pub fn label_for(&self, build: &str) -> Option<&str> {
        self.labels.get(build).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, build: &str) -> bool {
        self.labels.contains_key(build)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.labels.iter().map(|(b, l)| (b.as_str(), l.as_str()))
    }
}
