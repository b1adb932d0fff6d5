//! Host inventory over `/api/vcenter/host`.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::client::{Api, VsphereClient};
use super::types::{build_from_image_version, HostSoftware, HostSummary};
use crate::domain::{BuildUnreadable, ConnectionState, EntityRef, Host, HostId, ScopeKind};
use crate::error::Result;
use crate::port::InventoryProvider;

/// Query parameter filtering hosts by container.
fn scope_filter(scope: &EntityRef) -> (&'static str, &str) {
    let key = match scope.kind() {
        ScopeKind::Cluster => "clusters",
        ScopeKind::Datacenter => "datacenters",
        ScopeKind::Folder => "folders",
    };
    (key, scope.id())
}

impl VsphereClient {
    /// Build number of `host`, read from its base image.
    ///
    /// A failed lookup or an image without a build number is reported as
    /// [`BuildUnreadable`]; the host is then left untagged and counted as failed.
    async fn host_build(&self, host: &str) -> std::result::Result<String, BuildUnreadable> {
        let path = format!("api/esx/settings/hosts/{host}/software");
        let software = self
            .get_json::<HostSoftware>(Api::Inventory, &path, &[])
            .await
            .map_err(|e| {
                warn!(host, status = ?e.status(), error = %e, "could not read host software");
                BuildUnreadable {
                    reason: e.to_string(),
                    status: e.status(),
                }
            })?;

        let version = software.base_image.map(|image| image.version);
        match version.as_deref().and_then(build_from_image_version) {
            Some(build) => Ok(build.to_string()),
            None => {
                warn!(host, version = ?version, "base image carries no build number");
                Err(BuildUnreadable {
                    reason: match version {
                        Some(version) => format!("no build number in image version '{version}'"),
                        None => "host is not managed by an image".to_string(),
                    },
                    status: None,
                })
            }
        }
    }
}

#[async_trait]
impl InventoryProvider for VsphereClient {
    async fn list_hosts(&self, scope: Option<&EntityRef>) -> Result<Vec<Host>> {
        let query: Vec<(&str, &str)> = scope.map(scope_filter).into_iter().collect();
        let summaries: Vec<HostSummary> = self
            .get_json(Api::Inventory, "api/vcenter/host", &query)
            .await?;
        debug!(count = summaries.len(), scope = ?scope.map(ToString::to_string), "hosts listed");

        let mut hosts = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let state = ConnectionState::parse(&summary.connection_state);
            // Disconnected hosts are dropped by the caller; skip the lookup.
            let build = if state == ConnectionState::Disconnected {
                Ok(String::new())
            } else {
                self.host_build(&summary.host).await
            };
            let id = HostId::new(summary.host);
            hosts.push(match build {
                Ok(build) => Host::new(id, summary.name, build, state),
                Err(unreadable) => Host::with_unreadable_build(id, summary.name, unreadable, state),
            });
        }
        Ok(hosts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_maps_to_plural_filter() {
        assert_eq!(
            scope_filter(&EntityRef::cluster("domain-c8")),
            ("clusters", "domain-c8")
        );
        assert_eq!(
            scope_filter(&EntityRef::datacenter("datacenter-3")),
            ("datacenters", "datacenter-3")
        );
        assert_eq!(
            scope_filter(&EntityRef::folder("group-h4")),
            ("folders", "group-h4")
        );
    }
}
