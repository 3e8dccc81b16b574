//! Render command - render one configuration to a manifest

use crdform_core::AttrValue;
use std::path::Path;

use super::{build_provider, read_yaml, write_file};
use crate::config::Settings;
use crate::error::Result;

pub fn run(settings: &Settings, type_name: &str, file: &Path, output: Option<&Path>) -> Result<()> {
    let provider = build_provider(settings)?;
    let resource = provider.resource(type_name)?;

    let config = AttrValue::from(read_yaml::<serde_json::Value>(file)?);
    let manifest = resource.render(&config)?;
    tracing::debug!(id = %manifest.id, identity = %manifest.identity(), "rendered");

    match output {
        Some(path) => {
            write_file(path, &manifest.yaml)?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{}", manifest.yaml),
    }

    Ok(())
}
