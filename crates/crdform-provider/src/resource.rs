//! Resource definitions and their shared lifecycle
//!
//! Every resource type is plain data (identity, scope, schema). The
//! lifecycle below is the same for all of them: create and update render the
//! configuration from scratch, read and delete touch nothing.

use crdform_core::{AttrValue, ID_ATTRIBUTE, Schema, YAML_ATTRIBUTE, to_snake_case};
use crdform_engine::{RenderedManifest, Renderer, ResourceIdentity};
use std::fmt;

use crate::error::Result;

/// Data describing one version of one custom resource kind
#[derive(Debug, Clone)]
pub struct ResourceDefinition {
    pub identity: ResourceIdentity,
    pub namespaced: bool,
    pub schema: Schema,
}

impl ResourceDefinition {
    pub fn new(identity: ResourceIdentity, namespaced: bool, schema: Schema) -> Self {
        Self {
            identity,
            namespaced,
            schema,
        }
    }

    /// `<group>_<kind>_<version>` in snake_case
    ///
    /// `cert-manager.io/v1` `Certificate` → `cert_manager_io_certificate_v1`
    pub fn type_suffix(&self) -> String {
        let kind = to_snake_case(&self.identity.kind);
        let version = to_snake_case(self.identity.version());
        match self.identity.group() {
            Some(group) => format!("{}_{}_{}", to_snake_case(group), kind, version),
            None => format!("{}_{}", kind, version),
        }
    }

    /// Full resource type name under a provider prefix
    pub fn type_name(&self, prefix: &str) -> String {
        format!("{}_{}", prefix, self.type_suffix())
    }
}

/// What applying a planned state will do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanAction {
    Create,
    Update,
    NoOp,
}

impl fmt::Display for PlanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::NoOp => write!(f, "no-op"),
        }
    }
}

/// Result of planning one resource instance
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub action: PlanAction,
    /// Configuration plus computed attributes, unknown when they will change
    pub planned_state: AttrValue,
}

/// A registered resource type
#[derive(Debug, Clone)]
pub struct CustomResource {
    type_name: String,
    definition: ResourceDefinition,
    renderer: Renderer,
}

impl CustomResource {
    pub fn new(type_name: impl Into<String>, definition: ResourceDefinition, renderer: Renderer) -> Self {
        Self {
            type_name: type_name.into(),
            definition,
            renderer,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn definition(&self) -> &ResourceDefinition {
        &self.definition
    }

    pub fn identity(&self) -> &ResourceIdentity {
        &self.definition.identity
    }

    pub fn schema(&self) -> &Schema {
        &self.definition.schema
    }

    /// Check a configuration against the schema
    pub fn validate(&self, config: &AttrValue) -> Result<()> {
        self.definition.schema.validate(config)?;
        Ok(())
    }

    /// Validate and render without producing a state
    pub fn render(&self, config: &AttrValue) -> Result<RenderedManifest> {
        self.validate(config)?;
        let manifest = self
            .renderer
            .render(&self.definition.schema, config, &self.definition.identity)?;
        Ok(manifest)
    }

    /// Plan a configuration against the prior state, if any
    ///
    /// An unchanged configuration keeps the prior `id` and `yaml`; any other
    /// change leaves both unknown until apply.
    pub fn plan(&self, prior: Option<&AttrValue>, config: &AttrValue) -> Result<Plan> {
        self.validate(config)?;

        let plan = match prior {
            None => Plan {
                action: PlanAction::Create,
                planned_state: with_unknown_computed(config),
            },
            Some(prior) if configuration_of(prior) == *config => Plan {
                action: PlanAction::NoOp,
                planned_state: prior.clone(),
            },
            Some(_) => Plan {
                action: PlanAction::Update,
                planned_state: with_unknown_computed(config),
            },
        };

        tracing::debug!(resource = %self.type_name, action = %plan.action, "planned");
        Ok(plan)
    }

    /// Render a new instance and return its state
    pub fn create(&self, config: &AttrValue) -> Result<AttrValue> {
        let manifest = self.render(config)?;
        tracing::debug!(resource = %self.type_name, id = %manifest.id, "created");
        Ok(with_computed(config, &manifest))
    }

    /// Return the state as is
    ///
    /// The manifest is a cache of its own configuration; there is no
    /// external object to refresh from.
    pub fn read(&self, state: &AttrValue) -> Result<AttrValue> {
        Ok(state.clone())
    }

    /// Re-render from the new configuration
    pub fn update(&self, prior: &AttrValue, config: &AttrValue) -> Result<AttrValue> {
        let manifest = self.render(config)?;
        tracing::debug!(
            resource = %self.type_name,
            previous_id = prior.get(ID_ATTRIBUTE).and_then(AttrValue::as_str).unwrap_or_default(),
            id = %manifest.id,
            "updated"
        );
        Ok(with_computed(config, &manifest))
    }

    /// Nothing to tear down; dropping the state is the deletion
    pub fn delete(&self, state: &AttrValue) -> Result<()> {
        tracing::debug!(
            resource = %self.type_name,
            id = state.get(ID_ATTRIBUTE).and_then(AttrValue::as_str).unwrap_or_default(),
            "deleted"
        );
        Ok(())
    }
}

/// The configuration part of a state (everything but `id` and `yaml`)
pub fn configuration_of(state: &AttrValue) -> AttrValue {
    let mut config = state.clone();
    if let AttrValue::Object(attrs) | AttrValue::Map(attrs) = &mut config {
        attrs.shift_remove(ID_ATTRIBUTE);
        attrs.shift_remove(YAML_ATTRIBUTE);
    }
    config
}

/// Rendered manifest text of a state
pub fn manifest_of(state: &AttrValue) -> Option<&str> {
    state.get(YAML_ATTRIBUTE).and_then(AttrValue::as_str)
}

fn with_computed(config: &AttrValue, manifest: &RenderedManifest) -> AttrValue {
    config
        .clone()
        .with_attribute(ID_ATTRIBUTE, AttrValue::string(&manifest.id))
        .with_attribute(YAML_ATTRIBUTE, AttrValue::string(&manifest.yaml))
}

fn with_unknown_computed(config: &AttrValue) -> AttrValue {
    config
        .clone()
        .with_attribute(ID_ATTRIBUTE, AttrValue::Unknown)
        .with_attribute(YAML_ATTRIBUTE, AttrValue::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crdform_core::Attribute;
    use crdform_engine::SequentialIdGenerator;
    use serde_json::json;
    use std::sync::Arc;

    fn widget() -> CustomResource {
        let definition = ResourceDefinition::new(
            ResourceIdentity::new("example.com/v1", "Widget"),
            true,
            Schema::custom_resource("A widget", true).with_attribute(Attribute::object(
                "spec",
                vec![Attribute::int64("replicas").required()],
            )),
        );
        let renderer = Renderer::with_ids(Arc::new(SequentialIdGenerator::new(100)));
        CustomResource::new(definition.type_name("k8s"), definition, renderer)
    }

    fn config(replicas: i64) -> AttrValue {
        AttrValue::from(json!({"metadata": {"name": "x"}, "spec": {"replicas": replicas}}))
    }

    #[test]
    fn test_type_names() {
        let resource = widget();
        assert_eq!(resource.type_name(), "k8s_example_com_widget_v1");

        let definition = ResourceDefinition::new(
            ResourceIdentity::new("helm.toolkit.fluxcd.io/v2beta1", "HelmRelease"),
            true,
            Schema::default(),
        );
        assert_eq!(definition.type_suffix(), "helm_toolkit_fluxcd_io_helm_release_v2beta1");

        let core = ResourceDefinition::new(ResourceIdentity::new("v1", "ConfigMap"), true, Schema::default());
        assert_eq!(core.type_name("k8s"), "k8s_config_map_v1");
    }

    #[test]
    fn test_lifecycle() {
        let resource = widget();

        // absent -> present
        let created = resource.create(&config(3)).unwrap();
        assert_eq!(created.get(ID_ATTRIBUTE).and_then(AttrValue::as_str), Some("100"));
        assert_eq!(
            manifest_of(&created),
            Some("apiVersion: example.com/v1\nkind: Widget\nmetadata:\n  name: x\nspec:\n  replicas: 3\n")
        );

        // read is a no-op
        assert_eq!(resource.read(&created).unwrap(), created);

        // present -> present, always a fresh render
        let updated = resource.update(&created, &config(5)).unwrap();
        assert_eq!(updated.get(ID_ATTRIBUTE).and_then(AttrValue::as_str), Some("101"));
        assert!(manifest_of(&updated).unwrap().contains("replicas: 5"));

        // present -> absent
        resource.delete(&updated).unwrap();
    }

    #[test]
    fn test_plan_actions() {
        let resource = widget();

        let plan = resource.plan(None, &config(3)).unwrap();
        assert_eq!(plan.action, PlanAction::Create);
        assert!(plan.planned_state.get(ID_ATTRIBUTE).unwrap().is_unknown());

        let state = resource.create(&config(3)).unwrap();
        let plan = resource.plan(Some(&state), &config(3)).unwrap();
        assert_eq!(plan.action, PlanAction::NoOp);
        assert_eq!(plan.planned_state, state);

        let plan = resource.plan(Some(&state), &config(4)).unwrap();
        assert_eq!(plan.action, PlanAction::Update);
        assert!(plan.planned_state.get(YAML_ATTRIBUTE).unwrap().is_unknown());
        assert_eq!(plan.planned_state.get_path("spec.replicas"), Some(&AttrValue::int(4)));
    }

    #[test]
    fn test_plan_accepts_unknown_values() {
        let resource = widget();
        let config = AttrValue::object([
            ("metadata", AttrValue::object([("name", AttrValue::Unknown)])),
            ("spec", AttrValue::object([("replicas", AttrValue::int(1))])),
        ]);

        assert_eq!(resource.plan(None, &config).unwrap().action, PlanAction::Create);
        assert!(matches!(resource.create(&config), Err(ProviderError::Render(_))));
    }

    #[test]
    fn test_create_rejects_invalid_configuration() {
        let resource = widget();
        let config = AttrValue::from(json!({"metadata": {"name": "Bad_Name"}, "spec": {}}));

        match resource.create(&config) {
            Err(ProviderError::Validation(report)) => {
                assert_eq!(report.len(), 2);
                assert_eq!(report.issues_at("metadata.name").count(), 1);
                assert_eq!(report.issues_at("spec.replicas").count(), 1);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_configuration_of_strips_computed() {
        let state = widget().create(&config(3)).unwrap();
        assert_eq!(configuration_of(&state), config(3));
    }
}
