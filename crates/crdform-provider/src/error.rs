//! Error types for crdform-provider

use crdform_core::{CoreError, ValidationReport};
use crdform_engine::RenderError;
use miette::Diagnostic;
use thiserror::Error;

/// Result type for crdform-provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Errors that can occur while managing resources
#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum ProviderError {
    /// Rendering failed; nothing was produced
    #[error(transparent)]
    #[diagnostic(transparent)]
    Render(#[from] RenderError),

    /// Configuration does not match the resource schema
    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationReport),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Core(#[from] CoreError),

    /// No resource type registered under this name
    #[error("unknown resource type '{name}'")]
    #[diagnostic(code(crdform::provider::unknown_type))]
    UnknownResourceType {
        name: String,
        #[help]
        suggestion: Option<String>,
    },

    /// CRD manifest could not be imported
    #[error("invalid CRD: {0}")]
    #[diagnostic(code(crdform::crd::invalid))]
    InvalidCrd(String),

    /// Stored state cannot be used
    #[error("invalid state for '{address}': {message}")]
    #[diagnostic(code(crdform::state::invalid))]
    InvalidState { address: String, message: String },

    /// Storage error
    #[error("storage error: {0}")]
    #[diagnostic(code(crdform::state::storage))]
    Storage(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        ProviderError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for ProviderError {
    fn from(e: serde_yaml::Error) -> Self {
        ProviderError::Serialization(e.to_string())
    }
}
