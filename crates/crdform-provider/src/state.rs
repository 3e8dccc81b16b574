//! State storage
//!
//! The state records the last applied configuration of every resource
//! instance, with its `id` and `yaml`. Two stores are provided:
//! - **Memory**: for tests and one-shot runs
//! - **File**: a single JSON document on disk

use crdform_core::{AttrValue, Dynamic};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use crate::error::{ProviderError, Result};

/// Version of the state file format
pub const STATE_FORMAT_VERSION: u32 = 1;

/// One resource instance as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredResource {
    /// `<type_name>.<name>`
    pub address: String,
    pub type_name: String,
    pub state: serde_json::Value,
}

impl StoredResource {
    /// Capture a wholly known state
    pub fn new(type_name: &str, name: &str, state: &AttrValue) -> Result<Self> {
        let address = address(type_name, name);
        let json = Dynamic::decode(state)
            .and_then(|d| d.to_json_value())
            .map_err(|e| ProviderError::InvalidState {
                address: address.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            address,
            type_name: type_name.to_string(),
            state: json,
        })
    }

    /// Instance name part of the address
    pub fn name(&self) -> &str {
        self.address
            .strip_prefix(&self.type_name)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(&self.address)
    }

    /// The state as a structured value
    pub fn attributes(&self) -> AttrValue {
        AttrValue::from(self.state.clone())
    }
}

/// Address of a resource instance
pub fn address(type_name: &str, name: &str) -> String {
    format!("{}.{}", type_name, name)
}

/// Storage for resource states
pub trait StateStore: Send + Sync {
    fn get(&self, address: &str) -> Result<Option<StoredResource>>;

    /// Insert or replace
    fn put(&self, resource: StoredResource) -> Result<()>;

    /// Remove, returning what was stored
    fn remove(&self, address: &str) -> Result<Option<StoredResource>>;

    /// All resources in insertion order
    fn list(&self) -> Result<Vec<StoredResource>>;

    fn contains(&self, address: &str) -> Result<bool> {
        Ok(self.get(address)?.is_some())
    }
}

fn lock_poisoned<T>(_: T) -> ProviderError {
    ProviderError::Storage("state lock poisoned".to_string())
}

/// In-memory state store
#[derive(Clone, Default)]
pub struct MemoryStateStore {
    resources: Arc<RwLock<IndexMap<String, StoredResource>>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStateStore {
    fn get(&self, address: &str) -> Result<Option<StoredResource>> {
        let resources = self.resources.read().map_err(lock_poisoned)?;
        Ok(resources.get(address).cloned())
    }

    fn put(&self, resource: StoredResource) -> Result<()> {
        let mut resources = self.resources.write().map_err(lock_poisoned)?;
        resources.insert(resource.address.clone(), resource);
        Ok(())
    }

    fn remove(&self, address: &str) -> Result<Option<StoredResource>> {
        let mut resources = self.resources.write().map_err(lock_poisoned)?;
        Ok(resources.shift_remove(address))
    }

    fn list(&self) -> Result<Vec<StoredResource>> {
        let resources = self.resources.read().map_err(lock_poisoned)?;
        Ok(resources.values().cloned().collect())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateDocument {
    version: u32,
    resources: Vec<StoredResource>,
}

/// JSON file state store
///
/// Every operation reads the file and every change rewrites it through a
/// temporary file, so the document on disk is always complete.
pub struct FileStateStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<IndexMap<String, StoredResource>> {
        if !self.path.exists() {
            return Ok(IndexMap::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let document: StateDocument = serde_json::from_str(&content)?;
        if document.version != STATE_FORMAT_VERSION {
            return Err(ProviderError::Storage(format!(
                "unsupported state format version {} in {} (expected {})",
                document.version,
                self.path.display(),
                STATE_FORMAT_VERSION
            )));
        }

        Ok(document
            .resources
            .into_iter()
            .map(|r| (r.address.clone(), r))
            .collect())
    }

    fn save(&self, resources: IndexMap<String, StoredResource>) -> Result<()> {
        let document = StateDocument {
            version: STATE_FORMAT_VERSION,
            resources: resources.into_values().collect(),
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(&document)?)?;
        std::fs::rename(&tmp, &self.path)?;

        tracing::debug!(path = %self.path.display(), count = document.resources.len(), "state saved");
        Ok(())
    }
}

impl StateStore for FileStateStore {
    fn get(&self, address: &str) -> Result<Option<StoredResource>> {
        let _guard = self.lock.lock().map_err(lock_poisoned)?;
        Ok(self.load()?.shift_remove(address))
    }

    fn put(&self, resource: StoredResource) -> Result<()> {
        let _guard = self.lock.lock().map_err(lock_poisoned)?;
        let mut resources = self.load()?;
        resources.insert(resource.address.clone(), resource);
        self.save(resources)
    }

    fn remove(&self, address: &str) -> Result<Option<StoredResource>> {
        let _guard = self.lock.lock().map_err(lock_poisoned)?;
        let mut resources = self.load()?;
        let removed = resources.shift_remove(address);
        if removed.is_some() {
            self.save(resources)?;
        }
        Ok(removed)
    }

    fn list(&self) -> Result<Vec<StoredResource>> {
        let _guard = self.lock.lock().map_err(lock_poisoned)?;
        Ok(self.load()?.into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(name: &str, replicas: i64) -> StoredResource {
        let state = AttrValue::from(json!({
            "id": "1",
            "metadata": {"name": name},
            "spec": {"replicas": replicas}
        }));
        StoredResource::new("k8s_example_com_widget_v1", name, &state).unwrap()
    }

    fn exercise(store: &dyn StateStore) {
        assert!(store.list().unwrap().is_empty());

        store.put(sample("a", 1)).unwrap();
        store.put(sample("b", 2)).unwrap();
        store.put(sample("a", 3)).unwrap();

        let a = store.get("k8s_example_com_widget_v1.a").unwrap().unwrap();
        assert_eq!(a.attributes().get_path("spec.replicas"), Some(&AttrValue::int(3)));
        assert_eq!(a.name(), "a");

        let addresses: Vec<String> = store.list().unwrap().into_iter().map(|r| r.address).collect();
        assert_eq!(addresses, ["k8s_example_com_widget_v1.a", "k8s_example_com_widget_v1.b"]);

        assert!(store.remove("k8s_example_com_widget_v1.a").unwrap().is_some());
        assert!(store.remove("k8s_example_com_widget_v1.a").unwrap().is_none());
        assert!(!store.contains("k8s_example_com_widget_v1.a").unwrap());
        assert!(store.contains("k8s_example_com_widget_v1.b").unwrap());
    }

    #[test]
    fn test_memory_store() {
        exercise(&MemoryStateStore::new());
    }

    #[test]
    fn test_file_store() {
        let dir = tempfile::tempdir().unwrap();
        exercise(&FileStateStore::new(dir.path().join("state").join("crdform.json")));
    }

    #[test]
    fn test_file_store_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crdform.json");

        FileStateStore::new(&path).put(sample("web", 3)).unwrap();

        let reloaded = FileStateStore::new(&path);
        let stored = reloaded.get("k8s_example_com_widget_v1.web").unwrap().unwrap();
        assert_eq!(stored, sample("web", 3));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_file_store_rejects_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crdform.json");
        std::fs::write(&path, r#"{"version": 99, "resources": []}"#).unwrap();

        let err = FileStateStore::new(&path).list().unwrap_err();
        assert!(matches!(err, ProviderError::Storage(_)));
    }

    #[test]
    fn test_unknown_values_cannot_be_stored() {
        let state = AttrValue::object([("id", AttrValue::Unknown)]);

        let err = StoredResource::new("k8s_example_com_widget_v1", "web", &state).unwrap_err();
        match err {
            ProviderError::InvalidState { address, .. } => {
                assert_eq!(address, "k8s_example_com_widget_v1.web");
            }
            other => panic!("expected invalid state, got {other:?}"),
        }
    }
}
