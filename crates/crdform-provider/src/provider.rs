//! Provider registry
//!
//! Holds every resource type, built in or imported from CRDs, under its full
//! type name. All resources share one renderer and thus one id generator.

use crdform_engine::{ClockIdGenerator, IdGenerator, Renderer, SequentialIdGenerator};
use indexmap::IndexMap;
use std::sync::Arc;

use crate::definitions::builtin_definitions;
use crate::error::{ProviderError, Result};
use crate::resource::{CustomResource, ResourceDefinition};

/// Prefix of resource type names
pub const DEFAULT_TYPE_PREFIX: &str = "k8s";

/// Maximum edit distance for "did you mean" suggestions
const MAX_SUGGESTION_DISTANCE: usize = 5;

/// Provider builder
pub struct ProviderBuilder {
    prefix: String,
    ids: Option<Arc<dyn IdGenerator>>,
    builtins: bool,
    definitions: Vec<ResourceDefinition>,
}

impl Default for ProviderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderBuilder {
    pub fn new() -> Self {
        Self {
            prefix: DEFAULT_TYPE_PREFIX.to_string(),
            ids: None,
            builtins: true,
            definitions: Vec::new(),
        }
    }

    /// Set the resource type prefix
    pub fn type_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Use counting ids starting at 1 (reproducible output)
    pub fn sequential_ids(self) -> Self {
        self.id_generator(Arc::new(SequentialIdGenerator::default()))
    }

    /// Skip the built-in resource types
    pub fn without_builtins(mut self) -> Self {
        self.builtins = false;
        self
    }

    /// Register an additional resource type
    pub fn definition(mut self, definition: ResourceDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    pub fn definitions(mut self, definitions: impl IntoIterator<Item = ResourceDefinition>) -> Self {
        self.definitions.extend(definitions);
        self
    }

    /// Build the provider
    ///
    /// Definitions registered later replace earlier ones with the same type
    /// name, so imported CRDs take precedence over built-ins.
    pub fn build(self) -> Provider {
        let ids = self.ids.unwrap_or_else(|| Arc::new(ClockIdGenerator::new()));
        let renderer = Renderer::with_ids(ids);

        let builtins = if self.builtins { builtin_definitions() } else { Vec::new() };

        let mut resources = IndexMap::new();
        for definition in builtins.into_iter().chain(self.definitions) {
            let type_name = definition.type_name(&self.prefix);
            let resource = CustomResource::new(type_name.clone(), definition, renderer.clone());
            if resources.insert(type_name.clone(), resource).is_some() {
                tracing::warn!(resource = %type_name, "resource type registered twice, keeping the later definition");
            }
        }

        tracing::debug!(count = resources.len(), prefix = %self.prefix, "provider ready");
        Provider {
            prefix: self.prefix,
            resources,
        }
    }
}

/// Registry of resource types
#[derive(Debug, Clone)]
pub struct Provider {
    prefix: String,
    resources: IndexMap<String, CustomResource>,
}

impl Provider {
    pub fn builder() -> ProviderBuilder {
        ProviderBuilder::new()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Look up a resource type by full name
    pub fn resource(&self, type_name: &str) -> Result<&CustomResource> {
        self.resources
            .get(type_name)
            .ok_or_else(|| ProviderError::UnknownResourceType {
                name: type_name.to_string(),
                suggestion: self.suggest(type_name),
            })
    }

    /// Registered resource types in registration order
    pub fn resources(&self) -> impl Iterator<Item = &CustomResource> {
        self.resources.values()
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    fn suggest(&self, type_name: &str) -> Option<String> {
        self.resources
            .keys()
            .map(|candidate| (candidate, strsim::levenshtein(type_name, candidate)))
            .filter(|(_, distance)| *distance <= MAX_SUGGESTION_DISTANCE)
            .min_by_key(|(_, distance)| *distance)
            .map(|(candidate, _)| format!("Did you mean `{}`?", candidate))
    }
}
