//! Manifest renderer
//!
//! One procedure shared by every resource type: walk the configuration along
//! the schema, translate attribute names to manifest names, drop unset
//! values, stamp the fixed identity and serialize. Create and update both
//! call it; there is no patch logic.

use crdform_core::{
    AttrValue, Attribute, AttributePath, AttributeType, Dynamic, Schema, ShapeError,
};
use indexmap::IndexMap;
use std::sync::Arc;

use crate::error::{RenderError, Result};
use crate::id::{ClockIdGenerator, IdGenerator};
use crate::manifest::{RenderedManifest, ResourceIdentity};

/// Renders configurations into manifests
#[derive(Clone)]
pub struct Renderer {
    ids: Arc<dyn IdGenerator>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer").finish_non_exhaustive()
    }
}

impl Renderer {
    /// Renderer with wall-clock identifiers
    pub fn new() -> Self {
        Self::with_ids(Arc::new(ClockIdGenerator::new()))
    }

    pub fn with_ids(ids: Arc<dyn IdGenerator>) -> Self {
        Self { ids }
    }

    /// Render one configuration
    ///
    /// The configuration must be wholly known. Attributes outside the schema,
    /// including any `api_version` or `kind` the caller set, are ignored.
    pub fn render(
        &self,
        schema: &Schema,
        config: &AttrValue,
        identity: &ResourceIdentity,
    ) -> Result<RenderedManifest> {
        if let Some(path) = config.first_unknown() {
            return Err(ShapeError::unknown(path).into());
        }

        let body = render_object(&schema.attributes, config, &AttributePath::root())?;
        self.render_dynamic(body, identity)
    }

    /// Stamp identity onto an already built tree and serialize it
    pub fn render_dynamic(
        &self,
        body: Dynamic,
        identity: &ResourceIdentity,
    ) -> Result<RenderedManifest> {
        let body = stamp_identity(body, identity)?;
        let id = self.ids.next_id();
        let yaml = body.encode_text()?;

        tracing::debug!(kind = %identity.kind, api_version = %identity.api_version, %id, "rendered manifest");

        Ok(RenderedManifest {
            id,
            api_version: identity.api_version.clone(),
            kind: identity.kind.clone(),
            yaml,
        })
    }
}

/// Put `apiVersion` and `kind` first, replacing whatever the body carried
fn stamp_identity(body: Dynamic, identity: &ResourceIdentity) -> Result<Dynamic> {
    let mut entries = match body {
        Dynamic::Map(entries) => entries,
        Dynamic::Null => IndexMap::new(),
        _ => {
            return Err(RenderError::encoding(
                &AttributePath::root(),
                "manifest body must be a map",
            ));
        }
    };

    entries.shift_remove("apiVersion");
    entries.shift_remove("kind");

    let mut stamped = IndexMap::with_capacity(entries.len() + 2);
    stamped.insert("apiVersion".to_string(), Dynamic::from(identity.api_version.as_str()));
    stamped.insert("kind".to_string(), Dynamic::from(identity.kind.as_str()));
    stamped.extend(entries);
    Ok(Dynamic::Map(stamped))
}

fn render_object(attributes: &[Attribute], value: &AttrValue, path: &AttributePath) -> Result<Dynamic> {
    let entries = match value {
        AttrValue::Object(entries) | AttrValue::Map(entries) => entries,
        AttrValue::Null => return Ok(Dynamic::Null),
        other => {
            return Err(RenderError::encoding(
                path,
                format!("expected object, got {}", other.type_name()),
            ));
        }
    };

    let mut rendered = IndexMap::with_capacity(entries.len());
    for attribute in attributes {
        let Some(manifest_name) = &attribute.manifest_name else {
            continue;
        };
        let Some(item) = entries.get(&attribute.name).filter(|v| !v.is_null()) else {
            continue;
        };

        let item_path = path.with_attribute(&attribute.name);
        rendered.insert(manifest_name.clone(), render_value(&attribute.ty, item, &item_path)?);
    }

    for name in entries.keys() {
        if !attributes.iter().any(|a| &a.name == name) {
            tracing::debug!(attribute = %path.with_attribute(name), "ignoring attribute outside the schema");
        }
    }

    Ok(Dynamic::Map(rendered))
}

fn render_value(ty: &AttributeType, value: &AttrValue, path: &AttributePath) -> Result<Dynamic> {
    match ty {
        AttributeType::Object(attributes) => render_object(attributes, value, path),
        AttributeType::List(inner) => {
            let items = value.as_elements().ok_or_else(|| {
                RenderError::encoding(path, format!("expected list, got {}", value.type_name()))
            })?;
            let rendered = items
                .iter()
                .enumerate()
                .map(|(i, item)| render_value(inner, item, &path.with_index(i)))
                .collect::<Result<Vec<_>>>()?;
            Ok(Dynamic::List(rendered))
        }
        AttributeType::Map(inner) => {
            let entries = value.as_object().ok_or_else(|| {
                RenderError::encoding(path, format!("expected map, got {}", value.type_name()))
            })?;
            let mut rendered = IndexMap::with_capacity(entries.len());
            for (key, item) in entries {
                rendered.insert(key.clone(), render_value(inner, item, &path.with_key(key))?);
            }
            Ok(Dynamic::Map(rendered))
        }
        // Scalars and dynamic sub-trees are carried verbatim
        _ => Ok(Dynamic::decode_at(value, path)?),
    }
}
