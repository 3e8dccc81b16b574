//! crdform Provider - Resource types for Kubernetes custom resources
//!
//! This crate provides:
//! - **Resources**: Data-only definitions sharing one create/read/update/delete lifecycle
//! - **Provider**: Registry of resource types with "did you mean" lookups
//! - **CRD Import**: Resource definitions generated from CustomResourceDefinitions
//! - **Built-ins**: cert-manager, Flux and Crossplane resource types
//! - **State**: Memory and file-backed storage of applied resources

pub mod crd;
pub mod definitions;
pub mod error;
pub mod provider;
pub mod resource;
pub mod state;

pub use crd::{CrdParser, CrdSchema, definitions_from_crd, load_definitions};
pub use definitions::builtin_definitions;
pub use error::{ProviderError, Result};
pub use provider::{DEFAULT_TYPE_PREFIX, Provider, ProviderBuilder};
pub use resource::{
    CustomResource, Plan, PlanAction, ResourceDefinition, configuration_of, manifest_of,
};
pub use state::{FileStateStore, MemoryStateStore, StateStore, StoredResource, address};
