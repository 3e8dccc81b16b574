//! crdform Core - Value model for Kubernetes custom resource configurations
//!
//! This crate provides the foundational types used throughout crdform:
//! - `AttrValue`: Structured configuration values with null and unknown states
//! - `Dynamic`: Untyped value container for fields without a static shape
//! - `Schema`: Attribute trees with validation
//! - `Validator`: Kubernetes naming rules and OpenAPI constraints

pub mod dynamic;
pub mod error;
pub mod naming;
pub mod path;
pub mod schema;
pub mod validators;
pub mod value;

pub use dynamic::Dynamic;
pub use error::{CoreError, Result, ShapeError, ShapeErrorKind};
pub use naming::{to_camel_case, to_snake_case};
pub use path::{AttributePath, PathStep};
pub use schema::{
    Attribute, AttributeType, ID_ATTRIBUTE, Presence, Schema, ValidationIssue, ValidationReport,
    YAML_ATTRIBUTE, metadata_attribute,
};
pub use validators::{Pattern, Validator};
pub use value::{AttrNumber, AttrValue};
