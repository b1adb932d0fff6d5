//! Idempotent creation of the category and tags a run assigns from.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, error, info, warn};

use super::ReconcileSettings;
use crate::domain::{
    BuildMapping, CategorySpec, ReconcileReport, ReleaseCatalog, Tag, TagCategory,
};
use crate::error::{Error, Result};
use crate::port::TagService;

const SENTINEL_DESCRIPTION: &str = "No catalog release matches this host's build";

/// Category, tags and build mapping prepared for the apply phase.
#[derive(Debug)]
pub(super) struct CatalogObjects {
    pub category: TagCategory,
    pub sentinel: Tag,
    pub mapping: BuildMapping,
    release_tags: HashMap<String, Tag>,
    failed_tags: HashMap<String, (Option<u16>, String)>,
}

impl CatalogObjects {
    /// Release tag for `label`, or the error that kept it from being ensured.
    pub fn release_tag(&self, label: &str) -> Result<&Tag> {
        if let Some(tag) = self.release_tags.get(label) {
            return Ok(tag);
        }
        let (status, message) = self
            .failed_tags
            .get(label)
            .cloned()
            .unwrap_or_else(|| (None, format!("release tag {label} was never ensured")));
        Err(Error::TagService {
            operation: "create tag",
            status,
            message,
        })
    }
}

/// Ensure the category, sentinel tag and per-release tags exist.
///
/// Category and sentinel failures are fatal. A release tag that cannot be
/// ensured only fails the hosts that need it.
pub(super) async fn ensure(
    tags: &dyn TagService,
    settings: &ReconcileSettings,
    category_name: &str,
    builds: &BTreeSet<String>,
    catalog: &ReleaseCatalog,
    report: &mut ReconcileReport,
) -> Result<CatalogObjects> {
    let category = ensure_category(tags, category_name, settings, report).await?;
    let sentinel = ensure_tag(
        tags,
        &settings.sentinel_tag,
        &category,
        SENTINEL_DESCRIPTION,
        report,
    )
    .await?;

    let mut mapping = BuildMapping::new();
    let mut release_tags = HashMap::new();
    let mut failed_tags = HashMap::new();

    for build in builds {
        let Some(descriptor) = catalog.get(build) else {
            if build.is_empty() {
                warn!("Host reports an empty build, using sentinel tag");
            } else {
                warn!(build = %build, "Build has no catalog entry, using sentinel tag");
            }
            continue;
        };

        let label = descriptor.tag_label();
        mapping.insert(build.clone(), label.clone());
        if release_tags.contains_key(&label) || failed_tags.contains_key(&label) {
            continue;
        }

        match ensure_tag(tags, &label, &category, &descriptor.tag_description(), report).await {
            Ok(tag) => {
                release_tags.insert(label, tag);
            }
            Err(err) => {
                error!(build = %build, tag = %label, error = %err, "Failed to ensure release tag");
                failed_tags.insert(label, (err.status(), err.to_string()));
            }
        }
    }

    info!(
        mapped = mapping.len(),
        unmapped = builds.len() - mapping.len(),
        tags = release_tags.len(),
        "Catalog objects ensured"
    );

    Ok(CatalogObjects {
        category,
        sentinel,
        mapping,
        release_tags,
        failed_tags,
    })
}

async fn ensure_category(
    tags: &dyn TagService,
    name: &str,
    settings: &ReconcileSettings,
    report: &mut ReconcileReport,
) -> Result<TagCategory> {
    if let Some(category) = tags.get_category(name).await? {
        debug!(category = %name, id = %category.id, "Category exists");
        return Ok(category);
    }

    let spec = CategorySpec::single_host(name, &settings.category_description);
    let category = tags.create_category(&spec).await?;
    info!(category = %name, id = %category.id, "Created category");
    report.created_category = true;
    Ok(category)
}

/// Existence is checked by name only. A tag found under another category
/// still counts as present.
async fn ensure_tag(
    tags: &dyn TagService,
    name: &str,
    category: &TagCategory,
    description: &str,
    report: &mut ReconcileReport,
) -> Result<Tag> {
    if let Some(tag) = tags.get_tag(name).await? {
        if tag.category_id != category.id {
            warn!(
                tag = %name,
                category = %category.name,
                found_in = %tag.category_id,
                "Tag exists under another category, reusing it"
            );
        } else {
            debug!(tag = %name, "Tag exists");
        }
        return Ok(tag);
    }

    let tag = tags.create_tag(name, category, description).await?;
    info!(tag = %name, description = %description, "Created tag");
    report.created_tags.push(name.to_string());
    Ok(tag)
}
