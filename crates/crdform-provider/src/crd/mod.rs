//! CRD import
//!
//! Turns CustomResourceDefinition manifests into resource definitions:
//!
//! - **Schema representation** (`schema`): Structured view of a CRD
//! - **Parsing** (`parser`): CRD YAML into schema structures
//! - **Conversion** (`convert`): OpenAPI properties into attributes
//!
//! # Type mapping
//!
//! | OpenAPI                                   | Attribute       |
//! |-------------------------------------------|-----------------|
//! | `string` / `integer` / `number` / `boolean` | scalar        |
//! | `x-kubernetes-int-or-string`              | int or string   |
//! | `array`                                   | list            |
//! | `object` with `properties`                | object          |
//! | `object` with `additionalProperties`      | map             |
//! | `x-kubernetes-preserve-unknown-fields`    | dynamic         |
//! | `object` without either                   | dynamic         |

mod convert;
mod parser;
mod schema;

pub use convert::{convert_property, convert_type, definitions_from_crd};
pub use parser::CrdParser;
pub use schema::{
    AdditionalProperties, CrdNames, CrdSchema, CrdScope, CrdVersionSchema, PropertyType,
    SchemaProperty,
};

use crate::error::Result;
use crate::resource::ResourceDefinition;

/// Resource definitions for every CRD in a YAML stream
pub fn load_definitions(yaml: &str) -> Result<Vec<ResourceDefinition>> {
    let crds = CrdParser::parse_all(yaml)?;
    let definitions: Vec<ResourceDefinition> = crds.iter().flat_map(definitions_from_crd).collect();

    tracing::debug!(crds = crds.len(), definitions = definitions.len(), "imported CRDs");
    Ok(definitions)
}
