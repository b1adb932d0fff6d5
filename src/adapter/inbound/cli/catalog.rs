//! Handler for the `catalog` command.

use serde_json::json;
use tabled::{Table, Tabled};

use crate::adapter::inbound::cli::command::CatalogArgs;
use crate::adapter::inbound::cli::output;
use crate::adapter::outbound::catalog::{CatalogLoader, FetchOptions};
use crate::domain::{Location, ReleaseCatalog};
use crate::error::{Error, Result};
use crate::infrastructure::config::settings::Config;
use crate::port::CatalogSource;

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "Build")]
    build: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Tag")]
    tag: String,
}

/// Execute the catalog command.
pub async fn execute(config: &Config, args: &CatalogArgs) -> Result<()> {
    let raw = args
        .location
        .as_deref()
        .unwrap_or(&config.catalog.location);
    let location = Location::classify(raw)?;
    let loader = CatalogLoader::new(FetchOptions {
        verify_tls: config.catalog.verify_tls || args.strict_tls,
        timeout: config.vcenter.timeout(),
    })?;

    let pb = output::spinner("Loading catalog...");
    let catalog = match loader.load(&location).await {
        Ok(catalog) => {
            output::spinner_success(&pb, &format!("Loaded {} entries", catalog.len()));
            catalog
        }
        Err(e) => {
            output::spinner_fail(&pb, "Catalog unavailable");
            return Err(e.into());
        }
    };

    match &args.build {
        Some(build) => show_build(&catalog, build),
        None => {
            summarize(&location, &catalog);
            Ok(())
        }
    }
}

fn show_build(catalog: &ReleaseCatalog, build: &str) -> Result<()> {
    let descriptor = catalog.get(build).ok_or_else(|| Error::UnmappedBuild {
        build: build.to_string(),
    })?;

    if output::is_json() {
        output::json_output(json!({
            "command": "catalog",
            "build": descriptor.build(),
            "version": descriptor.version(),
            "tag": descriptor.tag_label(),
            "description": descriptor.tag_description(),
        }));
        return Ok(());
    }

    output::field("Build", descriptor.build());
    output::field("Version", descriptor.version());
    output::field("Tag", output::highlight(descriptor.tag_label()));
    output::field("Description", descriptor.tag_description());
    Ok(())
}

fn summarize(location: &Location, catalog: &ReleaseCatalog) {
    if output::is_json() {
        output::json_output(json!({
            "command": "catalog",
            "location": location.to_string(),
            "entries": catalog.len(),
        }));
        return;
    }

    output::field("Location", location);
    output::field("Entries", catalog.len());

    if output::verbosity() > 0 {
        let rows: Vec<EntryRow> = catalog
            .iter()
            .map(|d| EntryRow {
                build: d.build().to_string(),
                version: d.version().to_string(),
                tag: d.tag_label(),
            })
            .collect();
        output::lines(&Table::new(rows).to_string());
    } else {
        output::hint("pass -v to list every entry");
    }
}
