//! Per-host tag assignment.

use tracing::{error, info};

use super::objects::CatalogObjects;
use crate::domain::{Host, HostOutcome, HostResult, Tag};
use crate::error::Result;
use crate::port::TagService;

/// Re-tag one host. Never fails the run; failures end up in the outcome.
///
/// Any current assignment in the category is removed first, even when it
/// already matches, so the host never holds two tags of the category.
pub(super) async fn apply_host(
    tags: &dyn TagService,
    host: &Host,
    objects: &CatalogObjects,
) -> HostOutcome {
    let mut removed = None;

    // Without a build there is nothing to decide; keep whatever it holds.
    if let Some(unreadable) = host.build_error() {
        error!(
            host = %host.id(),
            name = %host.name(),
            status = ?unreadable.status,
            reason = %unreadable.reason,
            "Host build unreadable, leaving its tag unchanged"
        );
        return outcome(
            host,
            removed,
            HostResult::Failed {
                reason: unreadable.to_string(),
                status: unreadable.status,
            },
        );
    }

    let result = match retag(tags, host, objects, &mut removed).await {
        Ok(result) => result,
        Err(err) => {
            error!(
                host = %host.id(),
                name = %host.name(),
                build = host.build().unwrap_or_default(),
                status = ?err.status(),
                error = %err,
                "Failed to tag host"
            );
            HostResult::Failed {
                reason: err.to_string(),
                status: err.status(),
            }
        }
    };

    outcome(host, removed, result)
}

fn outcome(host: &Host, removed: Option<String>, result: HostResult) -> HostOutcome {
    HostOutcome {
        host: host.id().clone(),
        name: host.name().to_string(),
        build: host.build().unwrap_or_default().to_string(),
        removed,
        result,
    }
}

async fn retag(
    tags: &dyn TagService,
    host: &Host,
    objects: &CatalogObjects,
    removed: &mut Option<String>,
) -> Result<HostResult> {
    // Resolve first so a missing release tag leaves the current assignment alone.
    let build = host.build().unwrap_or_default();
    let (tag, sentinel): (&Tag, bool) = match objects.mapping.label_for(build) {
        Some(label) => (objects.release_tag(label)?, false),
        None => (&objects.sentinel, true),
    };

    if let Some(current) = tags.get_assignment(&objects.category, host.id()).await? {
        tags.remove_assignment(&current).await?;
        *removed = Some(current.tag.name);
    }

    tags.create_assignment(tag, host.id()).await?;
    info!(
        host = %host.id(),
        name = %host.name(),
        build,
        tag = %tag.name,
        previous = removed.as_deref().unwrap_or("-"),
        "Host tagged"
    );
    let tag = tag.name.clone();
    Ok(if sentinel {
        HostResult::Sentinel { tag }
    } else {
        HostResult::Tagged { tag }
    })
}
