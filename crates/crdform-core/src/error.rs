//! Core error types

use miette::Diagnostic;
use thiserror::Error;

use crate::path::AttributePath;

/// Why a value could not be carried by the untyped container
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeErrorKind {
    /// The value is not yet known (planned, computed during apply)
    Unknown,
    /// Integer outside both the signed and unsigned 64-bit ranges
    IntegerOutOfRange(i128),
    /// NaN or infinity, which JSON cannot represent
    NonFiniteNumber(f64),
}

impl std::fmt::Display for ShapeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "value is not known yet"),
            Self::IntegerOutOfRange(n) => write!(f, "integer {} does not fit in 64 bits", n),
            Self::NonFiniteNumber(n) => write!(f, "number {} is not finite", n),
        }
    }
}

/// A value shape outside the untyped container's coverage
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
#[error("unsupported value at {path}: {kind}")]
#[diagnostic(
    code(crdform::value::shape),
    help("only JSON-compatible, fully known values can be rendered")
)]
pub struct ShapeError {
    /// Where the offending value sits
    pub path: AttributePath,
    /// What is wrong with it
    pub kind: ShapeErrorKind,
}

impl ShapeError {
    pub fn new(path: AttributePath, kind: ShapeErrorKind) -> Self {
        Self { path, kind }
    }

    /// An unknown value reached a point that needs a concrete one
    pub fn unknown(path: AttributePath) -> Self {
        Self::new(path, ShapeErrorKind::Unknown)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.kind, ShapeErrorKind::Unknown)
    }
}

#[derive(Error, Debug, Diagnostic)]
pub enum CoreError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Shape(#[from] ShapeError),

    #[error("YAML error: {0}")]
    #[diagnostic(code(crdform::value::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    #[diagnostic(code(crdform::value::json))]
    Json(#[from] serde_json::Error),

    #[error("Invalid validator: {message}")]
    #[diagnostic(code(crdform::schema::validator))]
    InvalidValidator { message: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
