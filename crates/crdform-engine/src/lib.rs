//! crdform Engine - Manifest rendering for Kubernetes custom resources
//!
//! This crate turns a validated configuration into manifest YAML:
//! - Schema-driven name translation (snake_case attributes, camelCase fields)
//! - Fixed identity stamping (`apiVersion`, `kind`)
//! - Omission of unset fields
//! - Pluggable synthetic identifiers

pub mod error;
pub mod id;
pub mod manifest;
pub mod renderer;

pub use error::{RenderError, Result};
pub use id::{ClockIdGenerator, IdGenerator, SequentialIdGenerator};
pub use manifest::{RenderedManifest, ResourceIdentity};
pub use renderer::Renderer;
