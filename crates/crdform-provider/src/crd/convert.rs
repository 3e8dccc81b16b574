//! CRD to resource definition conversion
//!
//! Each served version becomes one resource definition. Top-level fields
//! other than `apiVersion`, `kind`, `metadata` and `status` become attributes
//! next to the standard metadata block.

use crdform_core::{Attribute, AttributeType, Schema, Validator};
use crdform_engine::ResourceIdentity;
use serde_json::Value;

use super::schema::{AdditionalProperties, CrdSchema, CrdVersionSchema, PropertyType, SchemaProperty};
use crate::resource::ResourceDefinition;

/// Top-level fields the resource handles itself or never renders
const RESERVED_ROOT_FIELDS: &[&str] = &["apiVersion", "kind", "metadata", "status"];

/// Resource definitions for every served version of a CRD
pub fn definitions_from_crd(crd: &CrdSchema) -> Vec<ResourceDefinition> {
    crd.served_versions()
        .map(|version| definition_for_version(crd, version))
        .collect()
}

fn definition_for_version(crd: &CrdSchema, version: &CrdVersionSchema) -> ResourceDefinition {
    let identity = ResourceIdentity::new(format!("{}/{}", crd.group, version.name), &crd.names.kind);

    if version.deprecated {
        tracing::warn!(
            crd = %crd.name,
            version = %version.name,
            warning = version.deprecation_warning.as_deref().unwrap_or_default(),
            "importing deprecated version"
        );
    }

    let description = version
        .schema
        .as_ref()
        .and_then(|s| s.description.clone())
        .unwrap_or_else(|| format!("{} {}", crd.names.kind, identity.api_version));
    let mut schema = Schema::custom_resource(description, crd.is_namespaced());

    match version.schema.as_ref().and_then(|s| s.properties.as_ref()) {
        Some(properties) => {
            let root = version.schema.as_ref();
            for (name, property) in properties {
                if RESERVED_ROOT_FIELDS.contains(&name.as_str()) {
                    continue;
                }
                let required = root.is_some_and(|r| r.is_required(name));
                push_attribute(&mut schema.attributes, convert_property(name, property, required));
            }
        }
        // No structural schema: accept any spec
        None => schema.attributes.push(Attribute::dynamic("spec")),
    }

    ResourceDefinition::new(identity, crd.is_namespaced(), schema)
}

/// Add an attribute unless its snake_case name is taken
fn push_attribute(attributes: &mut Vec<Attribute>, attribute: Attribute) {
    if attributes.iter().any(|a| a.name == attribute.name) {
        tracing::warn!(
            attribute = %attribute.name,
            field = attribute.manifest_name.as_deref().unwrap_or_default(),
            "skipping field whose attribute name is already taken"
        );
        return;
    }
    attributes.push(attribute);
}

/// Convert one property into an attribute named after the manifest field
pub fn convert_property(manifest_name: &str, property: &SchemaProperty, required: bool) -> Attribute {
    let mut attribute = Attribute::from_manifest_name(manifest_name, convert_type(property));

    if required {
        attribute = attribute.required();
    }
    if let Some(description) = &property.description {
        attribute = attribute.describe(description.trim());
    }
    for validator in validators_for(manifest_name, property) {
        attribute = attribute.validate(validator);
    }
    attribute
}

/// Attribute type of a property
pub fn convert_type(property: &SchemaProperty) -> AttributeType {
    if property.x_int_or_string {
        return AttributeType::IntOrString;
    }
    if property.x_preserve_unknown || property.x_embedded_resource {
        return AttributeType::Dynamic;
    }

    match &property.type_ {
        PropertyType::String => AttributeType::String,
        PropertyType::Integer => AttributeType::Int64,
        PropertyType::Number => AttributeType::Float64,
        PropertyType::Boolean => AttributeType::Bool,
        PropertyType::Array => AttributeType::list_of(
            property
                .items
                .as_deref()
                .map_or(AttributeType::Dynamic, convert_type),
        ),
        PropertyType::Object if property.has_nested_properties() => {
            let mut attributes = Vec::new();
            for (name, nested) in property.properties.iter().flatten() {
                push_attribute(&mut attributes, convert_property(name, nested, property.is_required(name)));
            }
            AttributeType::Object(attributes)
        }
        PropertyType::Object => match &property.additional_properties {
            Some(AdditionalProperties::Schema(values)) => AttributeType::map_of(convert_type(values)),
            Some(AdditionalProperties::Denied) => AttributeType::Object(Vec::new()),
            Some(AdditionalProperties::Allowed) | None => AttributeType::Dynamic,
        },
        PropertyType::Unknown(_) => AttributeType::Dynamic,
    }
}

fn validators_for(field: &str, property: &SchemaProperty) -> Vec<Validator> {
    let mut validators = Vec::new();

    if let Some(values) = &property.enum_values {
        let allowed: Option<Vec<&str>> = values.iter().map(Value::as_str).collect();
        match allowed {
            Some(allowed) if !allowed.is_empty() => validators.push(Validator::one_of(allowed)),
            _ => tracing::debug!(field, "ignoring enum with non-string values"),
        }
    }

    if let Some(pattern) = &property.pattern {
        match Validator::pattern(pattern) {
            Ok(validator) => validators.push(validator),
            // OpenAPI patterns are ECMA regexes; lookarounds have no equivalent here
            Err(err) => tracing::warn!(field, error = %err, "ignoring unsupported pattern"),
        }
    }

    if property.min_length.is_some() || property.max_length.is_some() {
        validators.push(Validator::Length {
            min: property.min_length,
            max: property.max_length,
        });
    }

    if property.minimum.is_some() || property.maximum.is_some() {
        validators.push(Validator::Range {
            min: property.minimum,
            max: property.maximum,
        });
    }

    validators
}
