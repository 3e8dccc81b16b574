//! CRD YAML parser
//!
//! Parses CustomResourceDefinition YAML manifests into structured `CrdSchema`
//! values for schema generation.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use super::schema::{
    AdditionalProperties, CrdNames, CrdSchema, CrdScope, CrdVersionSchema, PropertyType,
    SchemaProperty,
};
use crate::error::{ProviderError, Result};

/// Parser for CRD YAML manifests
pub struct CrdParser;

impl CrdParser {
    /// Parse a single CRD YAML manifest
    pub fn parse(yaml: &str) -> Result<CrdSchema> {
        let value: Value = serde_yaml::from_str(yaml)
            .map_err(|e| ProviderError::InvalidCrd(format!("invalid CRD YAML: {}", e)))?;

        Self::parse_value(&value)
    }

    /// Parse every CRD in a multi-document YAML stream
    ///
    /// Empty documents and documents of other kinds are skipped.
    pub fn parse_all(yaml: &str) -> Result<Vec<CrdSchema>> {
        let mut crds = Vec::new();

        for document in serde_yaml::Deserializer::from_str(yaml) {
            let value = Value::deserialize(document)
                .map_err(|e| ProviderError::InvalidCrd(format!("invalid CRD YAML: {}", e)))?;

            match value.get("kind").and_then(Value::as_str) {
                Some("CustomResourceDefinition") => crds.push(Self::parse_value(&value)?),
                Some(kind) => tracing::debug!(kind, "skipping document that is not a CRD"),
                None if value.is_null() => {}
                None => tracing::debug!("skipping document without a kind"),
            }
        }

        Ok(crds)
    }

    /// Parse from a serde_json::Value
    pub fn parse_value(value: &Value) -> Result<CrdSchema> {
        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::InvalidCrd("missing 'kind' field".to_string()))?;

        if kind != "CustomResourceDefinition" {
            return Err(ProviderError::InvalidCrd(format!(
                "expected CustomResourceDefinition, got {}",
                kind
            )));
        }

        let name = value
            .get("metadata")
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::InvalidCrd("missing 'metadata.name' field".to_string()))?
            .to_string();

        let spec = value
            .get("spec")
            .ok_or_else(|| ProviderError::InvalidCrd(format!("{}: missing 'spec' field", name)))?;

        let group = spec
            .get("group")
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::InvalidCrd(format!("{}: missing 'spec.group' field", name)))?
            .to_string();

        let scope = spec
            .get("scope")
            .and_then(Value::as_str)
            .map(|s| match s {
                "Cluster" => CrdScope::Cluster,
                _ => CrdScope::Namespaced,
            })
            .unwrap_or_default();

        let names = Self::parse_names(&name, spec.get("names"))?;
        let versions = Self::parse_versions(&name, spec.get("versions"))?;

        Ok(CrdSchema {
            name,
            group,
            scope,
            names,
            versions,
        })
    }

    fn parse_names(crd: &str, names_value: Option<&Value>) -> Result<CrdNames> {
        let names = names_value
            .ok_or_else(|| ProviderError::InvalidCrd(format!("{}: missing 'spec.names' field", crd)))?;

        let kind = names
            .get("kind")
            .and_then(Value::as_str)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ProviderError::InvalidCrd(format!("{}: missing 'spec.names.kind' field", crd)))?
            .to_string();

        Ok(CrdNames { kind })
    }

    fn parse_versions(crd: &str, versions_value: Option<&Value>) -> Result<Vec<CrdVersionSchema>> {
        let versions = versions_value
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::InvalidCrd(format!("{}: missing 'spec.versions' array", crd)))?;

        versions.iter().map(|v| Self::parse_version(crd, v)).collect()
    }

    fn parse_version(crd: &str, version: &Value) -> Result<CrdVersionSchema> {
        let name = version
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::InvalidCrd(format!("{}: version missing 'name' field", crd)))?
            .to_string();

        let flag = |key: &str, default: bool| version.get(key).and_then(Value::as_bool).unwrap_or(default);

        let schema = version
            .get("schema")
            .and_then(|s| s.get("openAPIV3Schema"))
            .map(Self::parse_schema_property);

        Ok(CrdVersionSchema {
            name,
            served: flag("served", true),
            deprecated: flag("deprecated", false),
            deprecation_warning: version
                .get("deprecationWarning")
                .and_then(Value::as_str)
                .map(String::from),
            schema,
        })
    }

    /// Parse a single schema property (recursive)
    fn parse_schema_property(prop: &Value) -> SchemaProperty {
        let type_ = prop
            .get("type")
            .and_then(Value::as_str)
            .map(PropertyType::parse)
            .unwrap_or_default();

        let properties = prop
            .get("properties")
            .and_then(Value::as_object)
            .map(|obj| {
                obj.iter()
                    .map(|(k, v)| (k.clone(), Self::parse_schema_property(v)))
                    .collect::<IndexMap<_, _>>()
            });

        let required = prop
            .get("required")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_str).map(String::from).collect())
            .unwrap_or_default();

        let items = prop
            .get("items")
            .map(|v| Box::new(Self::parse_schema_property(v)));

        let additional_properties = prop.get("additionalProperties").map(|v| match v {
            Value::Bool(true) => AdditionalProperties::Allowed,
            Value::Bool(false) => AdditionalProperties::Denied,
            schema => AdditionalProperties::Schema(Box::new(Self::parse_schema_property(schema))),
        });

        let flag = |key: &str| prop.get(key).and_then(Value::as_bool).unwrap_or(false);

        SchemaProperty {
            type_,
            description: prop
                .get("description")
                .and_then(Value::as_str)
                .map(String::from),
            pattern: prop.get("pattern").and_then(Value::as_str).map(String::from),
            enum_values: prop.get("enum").and_then(Value::as_array).cloned(),
            minimum: prop.get("minimum").and_then(Value::as_f64),
            maximum: prop.get("maximum").and_then(Value::as_f64),
            min_length: prop.get("minLength").and_then(Value::as_u64),
            max_length: prop.get("maxLength").and_then(Value::as_u64),
            properties,
            required,
            items,
            additional_properties,
            x_preserve_unknown: flag("x-kubernetes-preserve-unknown-fields"),
            x_embedded_resource: flag("x-kubernetes-embedded-resource"),
            x_int_or_string: flag("x-kubernetes-int-or-string"),
        }
    }
}
