//! Destroy command - delete every resource recorded in the state

use console::style;
use crdform_provider::{FileStateStore, StateStore};

use super::build_provider;
use crate::config::Settings;
use crate::display;
use crate::error::Result;

pub fn run(settings: &Settings, dry_run: bool) -> Result<()> {
    let provider = build_provider(settings)?;
    let store = FileStateStore::new(settings.state_path.clone());

    let resources = store.list()?;
    if resources.is_empty() {
        println!("No resources in {}", settings.state_path.display());
        return Ok(());
    }

    for stored in &resources {
        println!("{}", display::delete_line(&stored.address));
    }
    if dry_run {
        println!();
        let summary = display::ApplySummary {
            deleted: resources.len(),
            ..Default::default()
        };
        println!("{}", summary.plan_text());
        return Ok(());
    }

    for stored in &resources {
        match provider.resource(&stored.type_name) {
            Ok(resource) => resource.delete(&stored.attributes())?,
            Err(_) => tracing::warn!(
                address = %stored.address,
                "resource type is no longer registered; dropping its state"
            ),
        }
        store.remove(&stored.address)?;
    }

    println!();
    println!(
        "{} Destroy complete! Resources: {} destroyed.",
        style("✓").green().bold(),
        resources.len()
    );
    Ok(())
}
