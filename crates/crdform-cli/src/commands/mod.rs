//! CLI commands

pub mod apply;
pub mod destroy;
pub mod import_crd;
pub mod list;
pub mod render;
pub mod schema;

use crdform_provider::{Provider, ResourceDefinition, load_definitions};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Settings;
use crate::error::{CliError, Result};

/// Provider with the built-in types plus every configured CRD
pub fn build_provider(settings: &Settings) -> Result<Provider> {
    let mut builder = Provider::builder().type_prefix(&settings.type_prefix);
    if settings.sequential_ids {
        builder = builder.sequential_ids();
    }

    for path in &settings.crd_paths {
        builder = builder.definitions(load_crd_path(path)?);
    }

    let provider = builder.build();
    tracing::debug!(types = provider.len(), "provider ready");
    Ok(provider)
}

/// Resource definitions from a CRD file or every YAML file under a directory
pub fn load_crd_path(path: &Path) -> Result<Vec<ResourceDefinition>> {
    let mut definitions = Vec::new();

    for file in crd_files(path)? {
        let content = read_file(&file)?;
        let imported = load_definitions(&content).map_err(|e| CliError::crd(&file, e))?;
        tracing::debug!(file = %file.display(), definitions = imported.len(), "loaded CRD file");
        definitions.extend(imported);
    }

    Ok(definitions)
}

/// YAML files at a path, in a stable order
fn crd_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        return Err(CliError::input(format!("CRD path not found: {}", path.display())));
    }
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.map_err(|e| CliError::Io {
            message: format!("{}: {}", path.display(), e),
        })?;
        if entry.file_type().is_file() && is_yaml(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

pub fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| CliError::io(path, e))
}

/// Read and deserialize a YAML file
pub fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = read_file(path)?;
    serde_yaml::from_str(&content)
        .map_err(|e| CliError::input(format!("invalid YAML in {}: {}", path.display(), e)))
}

pub fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CliError::io(parent, e))?;
    }
    std::fs::write(path, content).map_err(|e| CliError::io(path, e))
}
