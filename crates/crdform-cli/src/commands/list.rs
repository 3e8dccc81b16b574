//! List command - list registered resource types

use console::style;
use serde::Serialize;

use super::build_provider;
use crate::config::Settings;
use crate::error::{CliError, Result};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TypeEntry<'a> {
    type_name: &'a str,
    api_version: &'a str,
    kind: &'a str,
    namespaced: bool,
}

/// Run the list command
pub fn run(settings: &Settings, output_json: bool) -> Result<()> {
    let provider = build_provider(settings)?;

    let entries: Vec<TypeEntry> = provider
        .resources()
        .map(|resource| TypeEntry {
            type_name: resource.type_name(),
            api_version: &resource.identity().api_version,
            kind: &resource.identity().kind,
            namespaced: resource.definition().namespaced,
        })
        .collect();

    if output_json {
        let json = serde_json::to_string_pretty(&entries)
            .map_err(|e| CliError::internal(format!("failed to serialize types: {}", e)))?;
        println!("{}", json);
        return Ok(());
    }

    let width = entries.iter().map(|e| e.type_name.len()).max().unwrap_or(0).max(4);

    println!(
        "{:<width$}  {:<40}  {:<24}  {}",
        style("TYPE").bold(),
        style("API VERSION").bold(),
        style("KIND").bold(),
        style("SCOPE").bold(),
        width = width
    );

    for entry in &entries {
        let scope = if entry.namespaced { "Namespaced" } else { "Cluster" };
        println!(
            "{:<width$}  {:<40}  {:<24}  {}",
            entry.type_name,
            entry.api_version,
            entry.kind,
            style(scope).dim(),
            width = width
        );
    }

    Ok(())
}
