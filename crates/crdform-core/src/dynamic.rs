//! Untyped value container
//!
//! `Dynamic` carries values whose shape the static schema does not describe:
//! embedded resource templates, chart values, preserved unknown fields. It
//! moves between three representations without loss:
//!
//! - the structured [`AttrValue`] model (`decode` / `encode_structured`)
//! - the canonical tree held by this type
//! - YAML or JSON text (`encode_text` / `encode_json` and the parsers)
//!
//! Numbers keep their integer-ness and full 64-bit range through
//! `serde_json::Number`, maps keep their key order, and `Unknown` is a
//! state of its own: it survives decoding but refuses to be encoded as text.

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{self, Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::{Number, Value as JsonValue};
use std::fmt;

use crate::error::{Result, ShapeError, ShapeErrorKind};
use crate::path::AttributePath;
use crate::value::{AttrNumber, AttrValue};

/// A JSON-shaped value of unknown structure
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Dynamic {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<Dynamic>),
    Map(IndexMap<String, Dynamic>),
    /// Placeholder for a value computed later; never encoded as text
    Unknown,
}

impl Dynamic {
    /// Convert a structured value into the canonical form
    pub fn decode(value: &AttrValue) -> std::result::Result<Self, ShapeError> {
        Self::decode_at(value, &AttributePath::root())
    }

    /// Like [`Dynamic::decode`], reporting errors relative to `path`
    pub fn decode_at(value: &AttrValue, path: &AttributePath) -> std::result::Result<Self, ShapeError> {
        Ok(match value {
            AttrValue::Unknown => Self::Unknown,
            AttrValue::Null => Self::Null,
            AttrValue::Bool(b) => Self::Bool(*b),
            AttrValue::Number(n) => Self::Number(decode_number(*n, path)?),
            AttrValue::String(s) => Self::String(s.clone()),
            AttrValue::List(items) | AttrValue::Set(items) | AttrValue::Tuple(items) => {
                let decoded = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| Self::decode_at(item, &path.with_index(i)))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Self::List(decoded)
            }
            AttrValue::Object(attrs) => {
                let mut decoded = IndexMap::with_capacity(attrs.len());
                for (name, item) in attrs {
                    decoded.insert(name.clone(), Self::decode_at(item, &path.with_attribute(name))?);
                }
                Self::Map(decoded)
            }
            AttrValue::Map(entries) => {
                let mut decoded = IndexMap::with_capacity(entries.len());
                for (key, item) in entries {
                    decoded.insert(key.clone(), Self::decode_at(item, &path.with_key(key))?);
                }
                Self::Map(decoded)
            }
        })
    }

    /// Convert back into the structured model
    ///
    /// Lists come back as tuples and maps as objects, which is how the
    /// framework types a dynamic value it decoded from JSON.
    pub fn encode_structured(&self) -> AttrValue {
        match self {
            Self::Null => AttrValue::Null,
            Self::Unknown => AttrValue::Unknown,
            Self::Bool(b) => AttrValue::Bool(*b),
            Self::Number(n) => AttrValue::Number(encode_number(n)),
            Self::String(s) => AttrValue::String(s.clone()),
            Self::List(items) => AttrValue::Tuple(items.iter().map(Self::encode_structured).collect()),
            Self::Map(entries) => AttrValue::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.encode_structured()))
                    .collect(),
            ),
        }
    }

    /// Serialize to YAML
    ///
    /// Fails with a shape error naming the first unknown node, if any.
    pub fn encode_text(&self) -> Result<String> {
        self.ensure_known()?;
        Ok(serde_yaml::to_string(self)?)
    }

    /// Serialize to compact JSON, with the same unknown rule as YAML
    pub fn encode_json(&self) -> Result<String> {
        self.ensure_known()?;
        Ok(serde_json::to_string(self)?)
    }

    /// Parse YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Convert into a `serde_json::Value`
    pub fn to_json_value(&self) -> std::result::Result<JsonValue, ShapeError> {
        to_json_at(self, &AttributePath::root())
    }

    /// Build a tree from any serializable value
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self::from(serde_json::to_value(value)?))
    }

    /// Path of the first unknown node
    pub fn find_unknown(&self) -> Option<AttributePath> {
        find_unknown(self, &AttributePath::root())
    }

    /// Error if any node is unknown
    pub fn ensure_known(&self) -> std::result::Result<(), ShapeError> {
        match self.find_unknown() {
            Some(path) => Err(ShapeError::unknown(path)),
            None => Ok(()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    pub fn get(&self, key: &str) -> Option<&Dynamic> {
        match self {
            Self::Map(entries) => entries.get(key),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Dynamic>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut IndexMap<String, Dynamic>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Dynamic]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Build a map from `(key, value)` pairs
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Dynamic)>,
    {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

fn decode_number(n: AttrNumber, path: &AttributePath) -> std::result::Result<Number, ShapeError> {
    match n {
        AttrNumber::Int(i) => {
            if let Ok(signed) = i64::try_from(i) {
                Ok(Number::from(signed))
            } else if let Ok(unsigned) = u64::try_from(i) {
                Ok(Number::from(unsigned))
            } else {
                Err(ShapeError::new(path.clone(), ShapeErrorKind::IntegerOutOfRange(i)))
            }
        }
        AttrNumber::Float(f) => Number::from_f64(f)
            .ok_or_else(|| ShapeError::new(path.clone(), ShapeErrorKind::NonFiniteNumber(f))),
    }
}

fn encode_number(n: &Number) -> AttrNumber {
    if let Some(i) = n.as_i64() {
        AttrNumber::Int(i.into())
    } else if let Some(u) = n.as_u64() {
        AttrNumber::Int(u.into())
    } else {
        // from_f64 rejected non-finite values, so a float is always present
        AttrNumber::Float(n.as_f64().unwrap_or_default())
    }
}

fn find_unknown(value: &Dynamic, path: &AttributePath) -> Option<AttributePath> {
    match value {
        Dynamic::Unknown => Some(path.clone()),
        Dynamic::List(items) => items
            .iter()
            .enumerate()
            .find_map(|(i, v)| find_unknown(v, &path.with_index(i))),
        Dynamic::Map(entries) => entries
            .iter()
            .find_map(|(k, v)| find_unknown(v, &path.with_key(k))),
        _ => None,
    }
}

fn to_json_at(value: &Dynamic, path: &AttributePath) -> std::result::Result<JsonValue, ShapeError> {
    Ok(match value {
        Dynamic::Unknown => return Err(ShapeError::unknown(path.clone())),
        Dynamic::Null => JsonValue::Null,
        Dynamic::Bool(b) => JsonValue::Bool(*b),
        Dynamic::Number(n) => JsonValue::Number(n.clone()),
        Dynamic::String(s) => JsonValue::String(s.clone()),
        Dynamic::List(items) => JsonValue::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, v)| to_json_at(v, &path.with_index(i)))
                .collect::<std::result::Result<_, _>>()?,
        ),
        Dynamic::Map(entries) => {
            let mut map = serde_json::Map::with_capacity(entries.len());
            for (k, v) in entries {
                map.insert(k.clone(), to_json_at(v, &path.with_key(k))?);
            }
            JsonValue::Object(map)
        }
    })
}

impl From<JsonValue> for Dynamic {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(b),
            JsonValue::Number(n) => Self::Number(n),
            JsonValue::String(s) => Self::String(s),
            JsonValue::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            JsonValue::Object(entries) => {
                Self::Map(entries.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Dynamic {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Dynamic {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Dynamic {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Dynamic {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<u64> for Dynamic {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

impl Serialize for Dynamic {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => n.serialize(serializer),
            Self::String(s) => serializer.serialize_str(s),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Self::Unknown => Err(ser::Error::custom("cannot serialize an unknown value")),
        }
    }
}

impl<'de> Deserialize<'de> for Dynamic {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(DynamicVisitor)
    }
}

struct DynamicVisitor;

impl<'de> Visitor<'de> for DynamicVisitor {
    type Value = Dynamic;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON-compatible value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Dynamic, E> {
        Ok(Dynamic::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Dynamic, E> {
        Ok(Dynamic::Number(v.into()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Dynamic, E> {
        Ok(Dynamic::Number(v.into()))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> std::result::Result<Dynamic, E> {
        decode_number(AttrNumber::Int(v), &AttributePath::root())
            .map(Dynamic::Number)
            .map_err(E::custom)
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> std::result::Result<Dynamic, E> {
        u64::try_from(v)
            .map(|u| Dynamic::Number(u.into()))
            .map_err(|_| E::custom(format!("integer {} does not fit in 64 bits", v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Dynamic, E> {
        Number::from_f64(v)
            .map(Dynamic::Number)
            .ok_or_else(|| E::custom(format!("number {} is not finite", v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Dynamic, E> {
        Ok(Dynamic::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Dynamic, E> {
        Ok(Dynamic::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Dynamic, E> {
        Ok(Dynamic::Null)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Dynamic, E> {
        Ok(Dynamic::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<Dynamic, D::Error> {
        Dynamic::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Dynamic, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Dynamic::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Dynamic, A::Error> {
        let mut entries = IndexMap::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, Dynamic>()? {
            entries.insert(key, value);
        }
        Ok(Dynamic::Map(entries))
    }

    fn visit_enum<A: de::EnumAccess<'de>>(self, _data: A) -> std::result::Result<Dynamic, A::Error> {
        Err(de::Error::custom("tagged values are not supported"))
    }
}
