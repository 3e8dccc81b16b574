//! Render error types

use crdform_core::{AttributePath, CoreError, ShapeError};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum RenderError {
    /// A value the untyped container cannot carry, or an unknown value
    #[error(transparent)]
    #[diagnostic(transparent)]
    Shape(#[from] ShapeError),

    /// The manifest tree could not be serialized
    #[error("Cannot encode manifest at {path}: {message}")]
    #[diagnostic(
        code(crdform::render::encoding),
        help("the configuration does not match the resource schema; run validation first")
    )]
    Encoding { path: AttributePath, message: String },
}

impl RenderError {
    pub fn encoding(path: &AttributePath, message: impl Into<String>) -> Self {
        Self::Encoding {
            path: path.clone(),
            message: message.into(),
        }
    }

    /// Path of the offending value
    pub fn path(&self) -> &AttributePath {
        match self {
            Self::Shape(err) => &err.path,
            Self::Encoding { path, .. } => path,
        }
    }
}

impl From<CoreError> for RenderError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Shape(shape) => Self::Shape(shape),
            other => Self::encoding(&AttributePath::root(), other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;
