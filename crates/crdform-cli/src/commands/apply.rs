//! Apply command - render declared resources and record them in the state
//!
//! Every declaration is validated and planned before the state is touched,
//! so an invalid configuration leaves the state as it was.

use console::style;
use crdform_core::AttrValue;
use once_cell::sync::Lazy;
use crdform_provider::{
    CustomResource, FileStateStore, PlanAction, Provider, ProviderError, StateStore,
    StoredResource, address, manifest_of,
};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use super::{build_provider, read_yaml, write_file};
use crate::config::Settings;
use crate::display::{self, ApplySummary};
use crate::error::{CliError, Result};

/// Declared names end up in state addresses and manifest file names
static RESOURCE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("valid regex"));

/// A resources file
///
/// ```yaml
/// resources:
///   - type: k8s_cert_manager_io_certificate_v1
///     name: web
///     config:
///       metadata:
///         name: web-tls
///       spec: {}
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResourcesFile {
    pub resources: Vec<Declaration>,
}

/// One declared resource instance
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Declaration {
    #[serde(rename = "type")]
    pub type_name: String,
    pub name: String,
    #[serde(default)]
    pub config: serde_json::Value,
}

struct Step<'a> {
    resource: &'a CustomResource,
    name: &'a str,
    address: String,
    config: AttrValue,
    prior: Option<AttrValue>,
    action: PlanAction,
}

pub fn run(settings: &Settings, file: &Path, output_dir: Option<&Path>, dry_run: bool) -> Result<()> {
    let provider = build_provider(settings)?;
    let store = FileStateStore::new(settings.state_path.clone());
    let resources: ResourcesFile = read_yaml(file)?;

    let summary = apply(&provider, &store, &resources, output_dir, dry_run)?;

    println!();
    if dry_run {
        println!("{}", summary.plan_text());
    } else if summary.has_changes() {
        println!("{} {}", style("✓").green().bold(), summary.apply_text());
    } else {
        println!("{} No changes. {}", style("✓").green().bold(), summary.apply_text());
    }
    Ok(())
}

/// Bring the state in line with the declarations
pub fn apply(
    provider: &Provider,
    store: &dyn StateStore,
    resources: &ResourcesFile,
    output_dir: Option<&Path>,
    dry_run: bool,
) -> Result<ApplySummary> {
    let steps = plan(provider, store, resources)?;

    let declared: HashSet<&str> = steps.iter().map(|s| s.address.as_str()).collect();
    let orphans: Vec<StoredResource> = store
        .list()?
        .into_iter()
        .filter(|stored| !declared.contains(stored.address.as_str()))
        .collect();

    let mut summary = ApplySummary::default();
    for step in &steps {
        println!("{}", display::plan_line(step.action, &step.address));
        summary.record(step.action);
    }
    for orphan in &orphans {
        println!("{}", display::delete_line(&orphan.address));
    }
    summary.deleted = orphans.len();

    if dry_run {
        return Ok(summary);
    }

    for step in &steps {
        let state = execute(step).map_err(|e| resource_error(&step.address, e))?;

        let stored = StoredResource::new(step.resource.type_name(), step.name, &state)?;
        store.put(stored)?;

        if let (Some(dir), Some(yaml)) = (output_dir, manifest_of(&state)) {
            write_file(&dir.join(format!("{}.yaml", step.address)), yaml)?;
        }
    }

    for orphan in &orphans {
        match provider.resource(&orphan.type_name) {
            Ok(resource) => resource
                .delete(&orphan.attributes())
                .map_err(|e| resource_error(&orphan.address, e))?,
            Err(_) => tracing::warn!(
                address = %orphan.address,
                "resource type is no longer registered; dropping its state"
            ),
        }
        store.remove(&orphan.address)?;
    }

    Ok(summary)
}

fn plan<'a>(
    provider: &'a Provider,
    store: &dyn StateStore,
    resources: &'a ResourcesFile,
) -> Result<Vec<Step<'a>>> {
    let mut seen = HashSet::new();
    let mut steps = Vec::with_capacity(resources.resources.len());

    for declaration in &resources.resources {
        if !RESOURCE_NAME.is_match(&declaration.name) {
            return Err(CliError::input_with_help(
                format!(
                    "resource of type {} has an invalid name '{}'",
                    declaration.type_name, declaration.name
                ),
                "names start with a letter or underscore and contain only letters, digits, '_' and '-'",
            ));
        }

        let resource = provider.resource(&declaration.type_name)?;
        let address = address(resource.type_name(), &declaration.name);
        if !seen.insert(address.clone()) {
            return Err(CliError::input_with_help(
                format!("{} is declared more than once", address),
                "give each resource of a type its own name",
            ));
        }

        let config = AttrValue::from(declaration.config.clone());
        let prior = store.get(&address)?.map(|stored| stored.attributes());
        let plan = resource
            .plan(prior.as_ref(), &config)
            .map_err(|e| resource_error(&address, e))?;

        steps.push(Step {
            resource,
            name: &declaration.name,
            address,
            config,
            prior,
            action: plan.action,
        });
    }

    Ok(steps)
}

fn execute(step: &Step<'_>) -> crdform_provider::Result<AttrValue> {
    let state = match (step.action, &step.prior) {
        (PlanAction::NoOp, Some(prior)) => step.resource.read(prior)?,
        (PlanAction::Update, Some(prior)) => {
            let state = step.resource.update(prior, &step.config)?;
            let diff = display::manifest_diff(
                manifest_of(prior).unwrap_or_default(),
                manifest_of(&state).unwrap_or_default(),
            );
            if !diff.is_empty() {
                println!();
                println!("{} {}", style("~").yellow(), style(&step.address).bold());
                print!("{}", diff);
            }
            state
        }
        _ => step.resource.create(&step.config)?,
    };
    Ok(state)
}

/// Name the resource an error belongs to
fn resource_error(address: &str, source: ProviderError) -> CliError {
    CliError::Resource {
        address: address.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crdform_provider::MemoryStateStore;

    fn provider() -> Provider {
        Provider::builder().sequential_ids().build()
    }

    fn resources(yaml: &str) -> ResourcesFile {
        serde_yaml::from_str(yaml).unwrap()
    }

    const CERTIFICATE: &str = r#"
resources:
  - type: k8s_cert_manager_io_certificate_v1
    name: web
    config:
      metadata:
        name: web-tls
        namespace: default
      spec:
        secret_name: web-tls
        issuer_ref:
          name: letsencrypt
          kind: ClusterIssuer
        dns_names: [example.com]
"#;

    const ADDRESS: &str = "k8s_cert_manager_io_certificate_v1.web";

    #[test]
    fn test_create_then_noop() {
        let provider = provider();
        let store = MemoryStateStore::new();

        let summary = apply(&provider, &store, &resources(CERTIFICATE), None, false).unwrap();
        assert_eq!(summary.created, 1);

        let stored = store.get(ADDRESS).unwrap().unwrap();
        let state = stored.attributes();
        assert_eq!(state.get("id"), Some(&AttrValue::string("1")));
        assert!(manifest_of(&state).unwrap().contains("kind: Certificate"));

        let summary = apply(&provider, &store, &resources(CERTIFICATE), None, false).unwrap();
        assert_eq!(summary.unchanged, 1);
        assert!(!summary.has_changes());
        assert_eq!(store.get(ADDRESS).unwrap().unwrap(), stored);
    }

    #[test]
    fn test_update_rerenders() {
        let provider = provider();
        let store = MemoryStateStore::new();
        apply(&provider, &store, &resources(CERTIFICATE), None, false).unwrap();

        let changed = CERTIFICATE.replace("[example.com]", "[example.com, www.example.com]");
        let summary = apply(&provider, &store, &resources(&changed), None, false).unwrap();
        assert_eq!(summary.updated, 1);

        let state = store.get(ADDRESS).unwrap().unwrap().attributes();
        assert_eq!(state.get("id"), Some(&AttrValue::string("2")));
        assert!(manifest_of(&state).unwrap().contains("www.example.com"));
    }

    #[test]
    fn test_undeclared_resources_are_deleted() {
        let provider = provider();
        let store = MemoryStateStore::new();
        apply(&provider, &store, &resources(CERTIFICATE), None, false).unwrap();

        let summary = apply(&provider, &store, &ResourcesFile::default(), None, false).unwrap();
        assert_eq!(summary.deleted, 1);
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let provider = provider();
        let store = MemoryStateStore::new();

        let summary = apply(&provider, &store, &resources(CERTIFICATE), None, true).unwrap();
        assert_eq!(summary.created, 1);
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_declaration_leaves_state_alone() {
        let provider = provider();
        let store = MemoryStateStore::new();
        apply(&provider, &store, &resources(CERTIFICATE), None, false).unwrap();
        let before = store.list().unwrap();

        let broken = format!(
            "{}\n  - type: k8s_cert_manager_io_certificate_v1\n    name: api\n    config:\n      metadata:\n        name: Not_Valid\n",
            CERTIFICATE.trim_end()
        );
        let err = apply(&provider, &store, &resources(&broken), None, false).unwrap_err();

        match err {
            CliError::Resource { address, source } => {
                assert_eq!(address, "k8s_cert_manager_io_certificate_v1.api");
                assert!(matches!(source, ProviderError::Validation(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.list().unwrap(), before);
    }

    #[test]
    fn test_duplicate_and_unknown_declarations() {
        let provider = provider();
        let store = MemoryStateStore::new();

        let duplicated = format!(
            "{}\n  - type: k8s_cert_manager_io_certificate_v1\n    name: web\n",
            CERTIFICATE.trim_end()
        );
        let err = apply(&provider, &store, &resources(&duplicated), None, false).unwrap_err();
        assert!(matches!(err, CliError::Input { .. }));

        let unknown = resources("resources:\n  - type: k8s_nope_v1\n    name: x\n");
        let err = apply(&provider, &store, &unknown, None, false).unwrap_err();
        assert!(matches!(
            err,
            CliError::Provider(ProviderError::UnknownResourceType { .. })
        ));
    }

    #[test]
    fn test_names_cannot_leave_the_output_dir() {
        let provider = provider();
        let store = MemoryStateStore::new();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");

        for name in ["../../../escaped", "nested/web", "web.tls", "9web", "''"] {
            let declared = CERTIFICATE.replace("name: web\n", &format!("name: {}\n", name));
            let err = apply(&provider, &store, &resources(&declared), Some(&out), false).unwrap_err();
            assert!(matches!(err, CliError::Input { .. }), "{name} was accepted");
        }

        assert!(store.list().unwrap().is_empty());
        assert!(!dir.path().join("escaped.yaml").exists());
        assert!(!out.exists());

        let declared = CERTIFICATE.replace("name: web\n", "name: web_tls-2\n");
        apply(&provider, &store, &resources(&declared), Some(&out), false).unwrap();
        assert!(out.join("k8s_cert_manager_io_certificate_v1.web_tls-2.yaml").exists());
    }

    #[test]
    fn test_manifests_written_to_output_dir() {
        let provider = provider();
        let store = MemoryStateStore::new();
        let dir = tempfile::tempdir().unwrap();

        apply(&provider, &store, &resources(CERTIFICATE), Some(dir.path()), false).unwrap();

        let written = std::fs::read_to_string(dir.path().join(format!("{}.yaml", ADDRESS))).unwrap();
        assert!(written.starts_with("apiVersion: cert-manager.io/v1\nkind: Certificate\n"));
    }
}
