//! Resource schemas
//!
//! A schema is a tree of attributes mirroring one CRD version. Attributes use
//! snake_case names on the configuration side and remember the camelCase
//! name they are rendered under in the manifest. Validation walks a
//! configuration against the tree and collects every problem it finds.

use miette::Diagnostic;
use std::fmt;
use thiserror::Error;

use crate::dynamic::Dynamic;
use crate::naming::{to_camel_case, to_snake_case};
use crate::path::AttributePath;
use crate::validators::Validator;
use crate::value::{AttrNumber, AttrValue};

/// Computed attribute holding the synthetic identifier
pub const ID_ATTRIBUTE: &str = "id";

/// Computed attribute holding the rendered manifest
pub const YAML_ATTRIBUTE: &str = "yaml";

/// Type of an attribute
#[derive(Debug, Clone)]
pub enum AttributeType {
    String,
    Int64,
    Float64,
    Bool,
    /// Kubernetes `int-or-string` (ports, percentages)
    IntOrString,
    List(Box<AttributeType>),
    /// String-keyed map; keys are rendered verbatim
    Map(Box<AttributeType>),
    Object(Vec<Attribute>),
    /// Open-ended value carried by [`Dynamic`]
    Dynamic,
}

impl AttributeType {
    pub fn list_of(inner: AttributeType) -> Self {
        Self::List(Box::new(inner))
    }

    pub fn map_of(inner: AttributeType) -> Self {
        Self::Map(Box::new(inner))
    }

    /// Nested attributes of objects, lists of objects and maps of objects
    pub fn nested(&self) -> Option<&[Attribute]> {
        match self {
            Self::Object(attrs) => Some(attrs),
            Self::List(inner) | Self::Map(inner) => inner.nested(),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Int64 => write!(f, "int64"),
            Self::Float64 => write!(f, "float64"),
            Self::Bool => write!(f, "bool"),
            Self::IntOrString => write!(f, "int or string"),
            Self::List(inner) => write!(f, "list of {}", inner),
            Self::Map(inner) => write!(f, "map of {}", inner),
            Self::Object(_) => write!(f, "object"),
            Self::Dynamic => write!(f, "dynamic"),
        }
    }
}

/// Whether the user must, may or cannot set an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Presence {
    Required,
    #[default]
    Optional,
    /// Set by the provider only
    Computed,
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => write!(f, "required"),
            Self::Optional => write!(f, "optional"),
            Self::Computed => write!(f, "computed"),
        }
    }
}

/// One attribute of a schema
#[derive(Debug, Clone)]
pub struct Attribute {
    /// Configuration-side name (snake_case)
    pub name: String,
    /// Manifest-side name; `None` for attributes that only live in state
    pub manifest_name: Option<String>,
    pub ty: AttributeType,
    pub presence: Presence,
    pub description: Option<String>,
    pub validators: Vec<Validator>,
}

impl Attribute {
    /// Optional attribute rendered under the camelCase form of `name`
    pub fn new(name: impl Into<String>, ty: AttributeType) -> Self {
        let name = name.into();
        Self {
            manifest_name: Some(to_camel_case(&name)),
            name,
            ty,
            presence: Presence::Optional,
            description: None,
            validators: Vec::new(),
        }
    }

    /// Attribute named after a manifest field, keeping the exact field name
    pub fn from_manifest_name(manifest_name: &str, ty: AttributeType) -> Self {
        Self {
            manifest_name: Some(manifest_name.to_string()),
            ..Self::new(to_snake_case(manifest_name), ty)
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, AttributeType::String)
    }

    pub fn int64(name: impl Into<String>) -> Self {
        Self::new(name, AttributeType::Int64)
    }

    pub fn float64(name: impl Into<String>) -> Self {
        Self::new(name, AttributeType::Float64)
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, AttributeType::Bool)
    }

    pub fn int_or_string(name: impl Into<String>) -> Self {
        Self::new(name, AttributeType::IntOrString)
    }

    pub fn string_list(name: impl Into<String>) -> Self {
        Self::new(name, AttributeType::list_of(AttributeType::String))
    }

    pub fn string_map(name: impl Into<String>) -> Self {
        Self::new(name, AttributeType::map_of(AttributeType::String))
    }

    pub fn object(name: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        Self::new(name, AttributeType::Object(attributes))
    }

    pub fn object_list(name: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        Self::new(name, AttributeType::list_of(AttributeType::Object(attributes)))
    }

    pub fn dynamic(name: impl Into<String>) -> Self {
        Self::new(name, AttributeType::Dynamic)
    }

    pub fn required(mut self) -> Self {
        self.presence = Presence::Required;
        self
    }

    pub fn computed(mut self) -> Self {
        self.presence = Presence::Computed;
        self
    }

    /// Never rendered into the manifest
    pub fn state_only(mut self) -> Self {
        self.manifest_name = None;
        self
    }

    /// Override the manifest-side name
    pub fn rendered_as(mut self, manifest_name: impl Into<String>) -> Self {
        self.manifest_name = Some(manifest_name.into());
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn is_required(&self) -> bool {
        self.presence == Presence::Required
    }

    pub fn is_computed(&self) -> bool {
        self.presence == Presence::Computed
    }
}

/// Standard `metadata` block of a custom resource
pub fn metadata_attribute(namespaced: bool) -> Attribute {
    let mut attributes = vec![
        Attribute::string("name")
            .required()
            .describe("Unique name of the resource, a DNS-1123 subdomain")
            .validate(Validator::Dns1123Subdomain),
    ];

    if namespaced {
        attributes.push(
            Attribute::string("namespace")
                .describe("Namespace of the resource, a DNS-1123 label")
                .validate(Validator::Dns1123Label),
        );
    }

    attributes.push(
        Attribute::string_map("labels")
            .describe("Key/value pairs used to organize and select objects")
            .validate(Validator::LabelKeys)
            .validate(Validator::LabelValues),
    );
    attributes.push(
        Attribute::string_map("annotations")
            .describe("Unstructured key/value metadata for tools and libraries")
            .validate(Validator::AnnotationKeys),
    );

    Attribute::object("metadata", attributes)
        .required()
        .describe("Data that uniquely identifies the resource")
}

/// Schema of one resource type
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub description: Option<String>,
    pub attributes: Vec<Attribute>,
}

impl Schema {
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self {
            description: None,
            attributes,
        }
    }

    /// Common shape of a custom resource: computed `id` and `yaml` plus the
    /// `metadata` block. Add `spec` (and any other top-level fields) with
    /// [`Schema::with_attribute`].
    pub fn custom_resource(description: impl Into<String>, namespaced: bool) -> Self {
        Self {
            description: Some(description.into()),
            attributes: vec![
                Attribute::string(ID_ATTRIBUTE)
                    .computed()
                    .state_only()
                    .describe("Synthetic identifier, regenerated on every render"),
                Attribute::string(YAML_ATTRIBUTE)
                    .computed()
                    .state_only()
                    .describe("The rendered manifest"),
                metadata_attribute(namespaced),
            ],
        }
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Validate a configuration, collecting every issue
    ///
    /// Unknown values are skipped; they are validated once known.
    pub fn validate(&self, config: &AttrValue) -> Result<(), ValidationReport> {
        let mut report = ValidationReport::default();
        validate_object(&self.attributes, config, &AttributePath::root(), &mut report);
        if report.is_empty() {
            Ok(())
        } else {
            Err(report)
        }
    }
}

/// A single validation finding
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub path: AttributePath,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Every issue found while validating one configuration
#[derive(Error, Debug, Diagnostic, Clone, Default, PartialEq)]
#[diagnostic(code(crdform::schema::invalid))]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn push(&mut self, path: &AttributePath, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            path: path.clone(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Issues reported for exactly this path
    pub fn issues_at<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a ValidationIssue> {
        self.issues.iter().filter(move |i| i.path.to_string() == path)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid configuration ({} issue(s))", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "\n  - {}", issue)?;
        }
        Ok(())
    }
}

fn validate_object(
    attributes: &[Attribute],
    value: &AttrValue,
    path: &AttributePath,
    report: &mut ValidationReport,
) {
    let entries = match value {
        AttrValue::Unknown => return,
        AttrValue::Null => {
            for attribute in attributes.iter().filter(|a| a.is_required()) {
                report.push(&path.with_attribute(&attribute.name), "required attribute is missing");
            }
            return;
        }
        AttrValue::Object(entries) | AttrValue::Map(entries) => entries,
        other => {
            report.push(path, format!("expected object, got {}", other.type_name()));
            return;
        }
    };

    for attribute in attributes {
        let attr_path = path.with_attribute(&attribute.name);
        let attr_value = entries.get(&attribute.name).unwrap_or(&AttrValue::Null);

        match attribute.presence {
            Presence::Computed if attr_value.is_known() => {
                report.push(&attr_path, "computed attribute cannot be set in configuration");
                continue;
            }
            Presence::Required if attr_value.is_null() => {
                report.push(&attr_path, "required attribute is missing");
                continue;
            }
            _ => {}
        }

        if !attr_value.is_known() {
            continue;
        }

        validate_value(&attribute.ty, attr_value, &attr_path, report);
        for validator in &attribute.validators {
            for message in validator.check(attr_value) {
                report.push(&attr_path, message);
            }
        }
    }

    for name in entries.keys() {
        if !attributes.iter().any(|a| &a.name == name) {
            report.push(&path.with_attribute(name), "unsupported attribute");
        }
    }
}

fn validate_value(
    ty: &AttributeType,
    value: &AttrValue,
    path: &AttributePath,
    report: &mut ValidationReport,
) {
    if value.is_unknown() {
        return;
    }

    let mismatch = |report: &mut ValidationReport| {
        report.push(path, format!("expected {}, got {}", ty, value.type_name()));
    };

    match ty {
        AttributeType::String => {
            if !matches!(value, AttrValue::String(_)) {
                mismatch(report);
            }
        }
        AttributeType::Int64 => match value {
            AttrValue::Number(AttrNumber::Int(n)) if i64::try_from(*n).is_err() => {
                report.push(path, format!("integer {} does not fit in int64", n));
            }
            AttrValue::Number(AttrNumber::Int(_)) => {}
            _ => mismatch(report),
        },
        AttributeType::Float64 => match value {
            AttrValue::Number(AttrNumber::Float(f)) if !f.is_finite() => {
                report.push(path, "number must be finite");
            }
            AttrValue::Number(_) => {}
            _ => mismatch(report),
        },
        AttributeType::Bool => {
            if !matches!(value, AttrValue::Bool(_)) {
                mismatch(report);
            }
        }
        AttributeType::IntOrString => {
            if !matches!(value, AttrValue::String(_) | AttrValue::Number(AttrNumber::Int(_))) {
                mismatch(report);
            }
        }
        AttributeType::List(inner) => match value.as_elements() {
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    let item_path = path.with_index(i);
                    if item.is_null() {
                        report.push(&item_path, "list elements must not be null");
                    } else {
                        validate_value(inner, item, &item_path, report);
                    }
                }
            }
            None => mismatch(report),
        },
        AttributeType::Map(inner) => match value.as_object() {
            Some(entries) => {
                for (key, item) in entries {
                    let item_path = path.with_key(key);
                    if item.is_null() {
                        report.push(&item_path, "map values must not be null");
                    } else {
                        validate_value(inner, item, &item_path, report);
                    }
                }
            }
            None => mismatch(report),
        },
        AttributeType::Object(attributes) => validate_object(attributes, value, path, report),
        AttributeType::Dynamic => {
            if let Err(err) = Dynamic::decode_at(value, path) {
                if !err.is_unknown() {
                    report.push(&err.path, err.kind.to_string());
                }
            }
        }
    }
}
