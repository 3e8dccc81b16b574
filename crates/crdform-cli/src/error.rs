//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use crdform_provider::ProviderError;
use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Provider, schema or render failure
    #[error(transparent)]
    #[diagnostic(transparent)]
    Provider(#[from] ProviderError),

    /// A declared resource could not be planned or applied
    #[error("Resource {address} failed")]
    #[diagnostic(code(crdform::cli::resource))]
    Resource {
        address: String,
        #[source]
        #[diagnostic_source]
        source: ProviderError,
    },

    /// CRD file could not be imported
    #[error("Failed to import CRDs from {path}")]
    #[diagnostic(code(crdform::cli::crd))]
    Crd {
        path: String,
        #[source]
        #[diagnostic_source]
        source: ProviderError,
    },

    /// Invalid configuration file
    #[error("Configuration error: {message}")]
    #[diagnostic(code(crdform::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// User supplied input that cannot be used
    #[error("Invalid input: {message}")]
    #[diagnostic(code(crdform::cli::input))]
    Input {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(crdform::cli::io))]
    Io { message: String },

    /// Internal error (unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(crdform::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Provider(err) => provider_exit_code(err),
            CliError::Resource { source, .. } => provider_exit_code(source),
            CliError::Crd { .. } => exit_codes::CRD_ERROR,
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Input { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create an input error (user provided invalid input)
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            help: None,
        }
    }

    /// Create an input error with help text
    pub fn input_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create an IO error naming the file involved
    pub fn io(path: &Path, err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{}: {}", path.display(), err),
        }
    }

    /// Wrap a CRD import failure with the file it came from
    pub fn crd(path: &Path, source: ProviderError) -> Self {
        Self::Crd {
            path: path.display().to_string(),
            source,
        }
    }
}

fn provider_exit_code(err: &ProviderError) -> i32 {
    match err {
        ProviderError::Validation(_) => exit_codes::VALIDATION_ERROR,
        ProviderError::Render(_) | ProviderError::Core(_) => exit_codes::RENDER_ERROR,
        ProviderError::InvalidCrd(_) => exit_codes::CRD_ERROR,
        ProviderError::UnknownResourceType { .. } => exit_codes::USAGE_ERROR,
        ProviderError::InvalidState { .. } | ProviderError::Storage(_) => exit_codes::STATE_ERROR,
        ProviderError::Io(_) => exit_codes::IO_ERROR,
        _ => exit_codes::ERROR,
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
