//! Handler for the `reconcile` command.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tabled::{Table, Tabled};
use tracing::warn;

use crate::adapter::inbound::cli::command::ReconcileArgs;
use crate::adapter::inbound::cli::output;
use crate::adapter::outbound::catalog::{CatalogLoader, FetchOptions};
use crate::adapter::outbound::vsphere::{ConnectOptions, VsphereClient};
use crate::application::{ReconcileRequest, Reconciler};
use crate::domain::{HostOutcome, HostResult, ReconcileReport};
use crate::error::Result;
use crate::infrastructure::config::settings::Config;

#[derive(Tabled)]
struct HostRow {
    #[tabled(rename = "Host")]
    name: String,
    #[tabled(rename = "Build")]
    build: String,
    #[tabled(rename = "Tag")]
    tag: String,
    #[tabled(rename = "Replaced")]
    removed: String,
    #[tabled(rename = "Result")]
    result: String,
}

impl From<&HostOutcome> for HostRow {
    fn from(outcome: &HostOutcome) -> Self {
        let (tag, result) = match &outcome.result {
            HostResult::Tagged { tag } => (tag.clone(), output::positive("tagged")),
            HostResult::Sentinel { tag } => (tag.clone(), output::highlight("no release")),
            HostResult::Failed { reason, .. } => (String::new(), output::negative(reason)),
        };
        Self {
            name: outcome.name.clone(),
            build: if outcome.build.is_empty() {
                output::muted("unknown")
            } else {
                outcome.build.clone()
            },
            tag,
            removed: outcome.removed.clone().unwrap_or_default(),
            result,
        }
    }
}

/// Execute the reconcile command.
pub async fn execute(config: &Config, args: &ReconcileArgs) -> Result<()> {
    let endpoint = config.vcenter.endpoint()?;
    let (username, password) = config.vcenter.credentials()?;

    let client = Arc::new(VsphereClient::new(&ConnectOptions {
        url: endpoint.clone(),
        insecure: config.vcenter.insecure || args.insecure,
        timeout: config.vcenter.timeout(),
    })?);
    let loader = CatalogLoader::new(FetchOptions {
        verify_tls: config.catalog.verify_tls || args.strict_tls,
        timeout: config.vcenter.timeout(),
    })?;

    let request = ReconcileRequest {
        catalog: args.catalog.clone(),
        category: args
            .category
            .clone()
            .unwrap_or_else(|| config.tagging.category.clone()),
        scope: args.scope.clone(),
        timeout: args.timeout.map(Duration::from_secs),
    };

    output::header(env!("CARGO_PKG_VERSION"));
    output::field("vCenter", &endpoint);
    output::field("Category", &request.category);
    output::field(
        "Scope",
        request
            .scope
            .as_ref()
            .map_or_else(|| "all hosts".to_string(), ToString::to_string),
    );
    output::field(
        "Catalog",
        request
            .catalog
            .as_deref()
            .unwrap_or(&config.catalog.location),
    );

    let pb = output::spinner("Signing in...");
    match client.login(username, password).await {
        Ok(true) => output::spinner_success(&pb, "Signed in"),
        Ok(false) => output::spinner_fail(&pb, "Credentials rejected"),
        Err(e) => {
            output::spinner_fail(&pb, "Sign-in failed");
            return Err(e);
        }
    }

    let mut reconciler = Reconciler::new(
        client.clone(),
        client.clone(),
        client.clone(),
        Arc::new(loader),
        config.reconcile_settings(),
    );

    let pb = output::spinner("Reconciling release tags...");
    let outcome = reconciler.run(&request).await;

    if let Err(e) = client.logout().await {
        warn!(error = %e, "Failed to close vCenter session");
    }

    match outcome {
        Ok(report) => {
            if report.is_clean() {
                output::spinner_success(&pb, "Reconciliation complete");
            } else {
                output::spinner_fail(&pb, "Reconciliation finished with failures");
            }
            print_report(&report);
            report.into_result().map(drop)
        }
        Err(e) => {
            output::spinner_fail(&pb, &format!("Aborted after stage '{}'", last_stage(&reconciler)));
            Err(e)
        }
    }
}

fn last_stage(reconciler: &Reconciler) -> String {
    reconciler
        .last_completed()
        .map_or_else(|| "none".to_string(), |stage| stage.to_string())
}

fn print_report(report: &ReconcileReport) {
    if output::is_json() {
        output::json_output(json!({
            "command": "reconcile",
            "report": report,
        }));
        return;
    }

    if !output::is_quiet() {
        let rows: Vec<HostRow> = report.hosts.iter().map(HostRow::from).collect();
        output::section("Hosts");
        output::lines(&Table::new(rows).to_string());
    }

    output::section("Summary");
    output::field("Hosts", report.hosts.len());
    output::field("Tagged", output::positive(report.tagged_count()));
    output::field("No release", report.sentinel_count());
    if report.failure_count() > 0 {
        output::field("Failed", output::negative(report.failure_count()));
    }
    if report.created_category {
        output::field("Created", format!("category {}", report.category));
    }
    if !report.created_tags.is_empty() && output::verbosity() > 0 {
        output::field("New tags", report.created_tags.join(", "));
    }

    for (build, hosts) in &report.unmapped_builds {
        let build = if build.is_empty() { "<empty>" } else { build };
        output::warning(&format!(
            "build {build} has no catalog entry ({} host{})",
            hosts.len(),
            if hosts.len() == 1 { "" } else { "s" }
        ));
    }
    if !report.unmapped_builds.is_empty() {
        output::hint(&format!(
            "check a build with {}",
            output::highlight("release-tagger catalog --build <BUILD>")
        ));
    }
}
