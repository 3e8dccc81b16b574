//! CLI configuration
//!
//! Settings come from three layers, later ones winning:
//! 1. The configuration file: `--config`, else `./crdform.yaml`, else
//!    `<config dir>/crdform/config.yaml`
//! 2. `CRDFORM_*` environment variables
//! 3. Command line flags
//!
//! Relative paths in a configuration file are resolved against the
//! directory holding it.

use crdform_provider::DEFAULT_TYPE_PREFIX;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::GlobalArgs;
use crate::error::{CliError, Result};

/// Configuration file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "crdform.yaml";

/// State file used when nothing else is configured
pub const DEFAULT_STATE_FILE: &str = "crdform.state.json";

/// Contents of a configuration file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct CliConfig {
    pub type_prefix: Option<String>,
    pub state_path: Option<PathBuf>,
    pub crd_paths: Vec<PathBuf>,
    pub sequential_ids: bool,
}

impl CliConfig {
    /// Load the explicit file, or the first one found in the lookup order
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) if !path.exists() => Err(CliError::config(format!(
                "configuration file not found: {}",
                path.display()
            ))),
            Some(path) => Self::from_file(path),
            None => match Self::discover() {
                Some(path) => Self::from_file(&path),
                None => Ok(Self::default()),
            },
        }
    }

    fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.is_file() {
            return Some(local);
        }

        dirs::config_dir()
            .map(|dir| dir.join("crdform").join("config.yaml"))
            .filter(|path| path.is_file())
    }

    /// Parse a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CliError::io(path, e))?;
        let config = Self::parse(&content)
            .map_err(|e| CliError::config(format!("{}: {}", path.display(), e)))?;

        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config.relative_to(path.parent().unwrap_or(Path::new(""))))
    }

    fn parse(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        // An empty file is an empty configuration
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    fn relative_to(mut self, base: &Path) -> Self {
        let resolve = |path: PathBuf| if path.is_relative() { base.join(path) } else { path };
        self.state_path = self.state_path.map(resolve);
        self.crd_paths = self.crd_paths.into_iter().map(resolve).collect();
        self
    }
}

/// Effective settings for one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub type_prefix: String,
    pub state_path: PathBuf,
    pub crd_paths: Vec<PathBuf>,
    pub sequential_ids: bool,
}

impl Settings {
    /// Apply flags and environment over the configuration file
    ///
    /// CRD paths accumulate: file entries first, then flags.
    pub fn resolve(config: CliConfig, args: &GlobalArgs) -> Self {
        let mut crd_paths = config.crd_paths;
        crd_paths.extend(args.crd.iter().cloned());

        Self {
            type_prefix: args
                .type_prefix
                .clone()
                .or(config.type_prefix)
                .unwrap_or_else(|| DEFAULT_TYPE_PREFIX.to_string()),
            state_path: args
                .state
                .clone()
                .or(config.state_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE)),
            crd_paths,
            sequential_ids: args.sequential_ids || config.sequential_ids,
        }
    }
}
