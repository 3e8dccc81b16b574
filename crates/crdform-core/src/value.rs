//! Structured attribute values
//!
//! `AttrValue` models the value system of the plugin framework that hands
//! configurations to resources. It is strongly but dynamically typed and,
//! unlike JSON, distinguishes three states at every node:
//!
//! - a known value (`String`, `Object`, ...)
//! - `Null`, an explicitly empty value
//! - `Unknown`, a value that will only be computed during apply
//!
//! Collections keep the framework's distinctions (list/set/tuple and
//! map/object) so that schema validation can tell them apart.

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::path::AttributePath;

/// Numeric attribute value
///
/// The framework's numbers are arbitrary precision; `i128` is wide enough to
/// carry integers that do not fit in 64 bits up to the point where they are
/// rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttrNumber {
    Int(i128),
    Float(f64),
}

impl std::fmt::Display for AttrNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{}", n),
            Self::Float(n) => write!(f, "{}", n),
        }
    }
}

/// A node of a structured configuration tree
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AttrValue {
    /// Not known until apply
    Unknown,
    #[default]
    Null,
    Bool(bool),
    Number(AttrNumber),
    String(String),
    List(Vec<AttrValue>),
    Set(Vec<AttrValue>),
    Tuple(Vec<AttrValue>),
    Map(IndexMap<String, AttrValue>),
    Object(IndexMap<String, AttrValue>),
}

impl AttrValue {
    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    pub fn int(n: impl Into<i128>) -> Self {
        Self::Number(AttrNumber::Int(n.into()))
    }

    pub fn float(n: f64) -> Self {
        Self::Number(AttrNumber::Float(n))
    }

    /// Build an object from `(attribute, value)` pairs
    pub fn object<K, I>(attributes: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, AttrValue)>,
    {
        Self::Object(attributes.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build a map from `(key, value)` pairs
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, AttrValue)>,
    {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn list<I: IntoIterator<Item = AttrValue>>(items: I) -> Self {
        Self::List(items.into_iter().collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// True when this node is neither null nor unknown
    pub fn is_known(&self) -> bool {
        !self.is_null() && !self.is_unknown()
    }

    /// True when no node in the tree is unknown
    pub fn is_wholly_known(&self) -> bool {
        self.first_unknown().is_none()
    }

    /// Path of the first unknown node, depth first in declaration order
    pub fn first_unknown(&self) -> Option<AttributePath> {
        find_unknown(self, &AttributePath::root())
    }

    /// Attribute of an object or entry of a map
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        match self {
            Self::Object(attrs) | Self::Map(attrs) => attrs.get(name),
            _ => None,
        }
    }

    /// Follow a dotted attribute path (`metadata.name`)
    pub fn get_path(&self, dotted: &str) -> Option<&AttrValue> {
        dotted
            .split('.')
            .try_fold(self, |value, part| value.get(part))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(AttrNumber::Int(n)) => i64::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(AttrNumber::Int(n)) => Some(*n as f64),
            Self::Number(AttrNumber::Float(n)) => Some(*n),
            _ => None,
        }
    }

    /// Attributes of an object or entries of a map
    pub fn as_object(&self) -> Option<&IndexMap<String, AttrValue>> {
        match self {
            Self::Object(attrs) | Self::Map(attrs) => Some(attrs),
            _ => None,
        }
    }

    /// Elements of a list, set or tuple
    pub fn as_elements(&self) -> Option<&[AttrValue]> {
        match self {
            Self::List(items) | Self::Set(items) | Self::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Set an attribute, turning a null value into an empty object first
    ///
    /// Values that are neither objects, maps nor null are left untouched.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: AttrValue) {
        if self.is_null() {
            *self = Self::Object(IndexMap::new());
        }
        if let Self::Object(attrs) | Self::Map(attrs) = self {
            attrs.insert(name.into(), value);
        }
    }

    /// Builder-style [`AttrValue::set_attribute`]
    pub fn with_attribute(mut self, name: impl Into<String>, value: AttrValue) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Short type description used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(AttrNumber::Int(_)) => "number (integer)",
            Self::Number(AttrNumber::Float(_)) => "number",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Tuple(_) => "tuple",
            Self::Map(_) => "map",
            Self::Object(_) => "object",
        }
    }
}

fn find_unknown(value: &AttrValue, path: &AttributePath) -> Option<AttributePath> {
    match value {
        AttrValue::Unknown => Some(path.clone()),
        AttrValue::Object(attrs) => attrs
            .iter()
            .find_map(|(name, v)| find_unknown(v, &path.with_attribute(name))),
        AttrValue::Map(entries) => entries
            .iter()
            .find_map(|(key, v)| find_unknown(v, &path.with_key(key))),
        AttrValue::List(items) | AttrValue::Set(items) | AttrValue::Tuple(items) => items
            .iter()
            .enumerate()
            .find_map(|(i, v)| find_unknown(v, &path.with_index(i))),
        _ => None,
    }
}

impl From<JsonValue> for AttrValue {
    /// JSON arrays become tuples and JSON objects become objects, the way the
    /// framework decodes JSON into a dynamically typed value.
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::int(i)
                } else if let Some(u) = n.as_u64() {
                    Self::int(u)
                } else {
                    Self::float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            JsonValue::String(s) => Self::String(s),
            JsonValue::Array(items) => Self::Tuple(items.into_iter().map(Self::from).collect()),
            JsonValue::Object(attrs) => {
                Self::Object(attrs.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for AttrValue {
    fn from(n: i64) -> Self {
        Self::int(n)
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        Self::float(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_unknown_and_known_are_distinct() {
        assert!(AttrValue::Null.is_null());
        assert!(!AttrValue::Null.is_unknown());
        assert!(AttrValue::Unknown.is_unknown());
        assert!(!AttrValue::Unknown.is_null());
        assert!(AttrValue::string("x").is_known());
        assert_ne!(AttrValue::Null, AttrValue::Unknown);
    }

    #[test]
    fn test_first_unknown_reports_path() {
        let value = AttrValue::object([
            ("metadata", AttrValue::object([("name", AttrValue::string("x"))])),
            (
                "spec",
                AttrValue::object([(
                    "values",
                    AttrValue::map([("tags", AttrValue::list([AttrValue::Null, AttrValue::Unknown]))]),
                )]),
            ),
        ]);

        let path = value.first_unknown().unwrap();
        assert_eq!(path.to_string(), r#"spec.values["tags"][1]"#);
        assert!(!value.is_wholly_known());
    }

    #[test]
    fn test_from_json_maps_collections_to_tuple_and_object() {
        let value = AttrValue::from(json!({"a": [1, "two", 3.5], "b": null}));

        let a = value.get("a").unwrap();
        assert!(matches!(a, AttrValue::Tuple(items) if items.len() == 3));
        assert_eq!(a.as_elements().unwrap()[0], AttrValue::int(1));
        assert_eq!(a.as_elements().unwrap()[2], AttrValue::float(3.5));
        assert!(value.get("b").unwrap().is_null());
    }

    #[test]
    fn test_from_json_keeps_u64_range() {
        let value = AttrValue::from(json!(u64::MAX));
        assert_eq!(value, AttrValue::int(u64::MAX));
    }

    #[test]
    fn test_set_attribute_on_null_creates_object() {
        let mut value = AttrValue::Null;
        value.set_attribute("id", AttrValue::string("1"));
        assert_eq!(value.get("id").and_then(AttrValue::as_str), Some("1"));
    }

    #[test]
    fn test_get_path() {
        let value = AttrValue::from(json!({"metadata": {"name": "web"}}));
        assert_eq!(value.get_path("metadata.name").and_then(AttrValue::as_str), Some("web"));
        assert!(value.get_path("metadata.namespace").is_none());
    }
}
