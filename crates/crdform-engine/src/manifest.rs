//! Rendered manifests and resource identity

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed `apiVersion` and `kind` of a resource type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceIdentity {
    pub api_version: String,
    pub kind: String,
}

impl ResourceIdentity {
    pub fn new(api_version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
        }
    }

    /// API group, `None` for the core group (`v1`)
    pub fn group(&self) -> Option<&str> {
        self.api_version.split_once('/').map(|(group, _)| group)
    }

    pub fn version(&self) -> &str {
        self.api_version
            .split_once('/')
            .map_or(self.api_version.as_str(), |(_, version)| version)
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind, self.api_version)
    }
}

/// Output of one render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedManifest {
    /// Synthetic identifier, new on every render
    pub id: String,
    pub api_version: String,
    pub kind: String,
    /// Manifest YAML, identity keys first
    pub yaml: String,
}

impl RenderedManifest {
    pub fn identity(&self) -> ResourceIdentity {
        ResourceIdentity::new(&self.api_version, &self.kind)
    }
}
