//! Integration tests for CLI commands

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Run crdform inside `dir`, isolated from user configuration
fn crdform_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_crdform"))
        .args(args)
        .current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env_remove("CRDFORM_CONFIG")
        .env_remove("CRDFORM_STATE")
        .env_remove("CRDFORM_TYPE_PREFIX")
        .env_remove("CRDFORM_SEQUENTIAL_IDS")
        .env_remove("CRDFORM_LOG")
        .output()
        .expect("Failed to execute crdform")
}

fn crdform(args: &[&str]) -> (TempDir, Output) {
    let dir = TempDir::new().unwrap();
    let output = crdform_in(dir.path(), args);
    (dir, output)
}

fn fixture(name: &str) -> String {
    fixtures_path().join(name).display().to_string()
}

fn fixtures_path() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures"))
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

mod render_command {
    use super::*;

    #[test]
    fn test_render_widget() {
        let (_dir, output) = crdform(&[
            "render",
            "k8s_example_com_widget_v1",
            "-f",
            &fixture("widget.yaml"),
            "--crd",
            &fixture("crds"),
        ]);

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert_eq!(
            stdout(&output),
            "apiVersion: example.com/v1\nkind: Widget\nmetadata:\n  name: x\nspec:\n  replicas: 3\n"
        );
    }

    #[test]
    fn test_render_to_file() {
        let dir = TempDir::new().unwrap();
        let output = crdform_in(
            dir.path(),
            &[
                "render",
                "k8s_example_com_widget_v1",
                "-f",
                &fixture("widget.yaml"),
                "--crd",
                &fixture("crds/widget.yaml"),
                "-o",
                "out/widget.yaml",
            ],
        );

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        let written = std::fs::read_to_string(dir.path().join("out/widget.yaml")).unwrap();
        assert!(written.starts_with("apiVersion: example.com/v1\nkind: Widget\n"));
    }

    #[test]
    fn test_unknown_type_suggests_a_name() {
        let (_dir, output) = crdform(&[
            "render",
            "k8s_example_com_widget_v2",
            "-f",
            &fixture("widget.yaml"),
            "--crd",
            &fixture("crds"),
        ]);

        assert_eq!(output.status.code(), Some(64));
        let stderr = stderr(&output);
        assert!(stderr.contains("unknown resource type"));
        assert!(stderr.contains("k8s_example_com_widget_v1"));
    }

    #[test]
    fn test_invalid_configuration() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("widget.yaml"), "metadata:\n  name: x\nspec:\n  replicas: 0\n").unwrap();

        let output = crdform_in(
            dir.path(),
            &[
                "render",
                "k8s_example_com_widget_v1",
                "-f",
                "widget.yaml",
                "--crd",
                &fixture("crds"),
            ],
        );

        assert_eq!(output.status.code(), Some(2));
        assert!(stdout(&output).is_empty());
        assert!(stderr(&output).contains("spec.replicas"));
    }

    #[test]
    fn test_missing_config_file() {
        let (_dir, output) = crdform(&["render", "k8s_cert_manager_io_certificate_v1", "-f", "nope.yaml"]);

        assert_eq!(output.status.code(), Some(5));
        assert!(stderr(&output).contains("nope.yaml"));
    }
}

mod apply_command {
    use super::*;

    fn apply(dir: &Path, extra: &[&str]) -> Output {
        let resources = fixture("resources.yaml");
        let crds = fixture("crds");
        let mut args = vec![
            "apply",
            "-f",
            resources.as_str(),
            "--crd",
            crds.as_str(),
            "--sequential-ids",
        ];
        args.extend_from_slice(extra);
        crdform_in(dir, &args)
    }

    #[test]
    fn test_apply_writes_state_and_manifests() {
        let dir = TempDir::new().unwrap();

        let output = apply(dir.path(), &["--output-dir", "manifests"]);
        assert!(output.status.success(), "stderr: {}", stderr(&output));

        let stdout = stdout(&output);
        assert!(stdout.contains("k8s_example_com_widget_v1.frontend"));
        assert!(stdout.contains("2 created, 0 updated, 0 unchanged, 0 deleted"));

        let state: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("crdform.state.json")).unwrap())
                .unwrap();
        assert_eq!(state["version"], 1);
        assert_eq!(state["resources"].as_array().unwrap().len(), 2);
        assert_eq!(state["resources"][0]["state"]["id"], "1");

        let manifest = std::fs::read_to_string(
            dir.path().join("manifests/k8s_example_com_widget_v1.frontend.yaml"),
        )
        .unwrap();
        assert!(manifest.contains("imageRef: registry.example.com/frontend:1.4.0"));
        assert!(manifest.contains("targetPort: http"));
        assert!(manifest.contains("featureFlags:"));
    }

    #[test]
    fn test_second_apply_changes_nothing() {
        let dir = TempDir::new().unwrap();
        assert!(apply(dir.path(), &[]).status.success());

        let output = apply(dir.path(), &[]);
        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(stdout(&output).contains("No changes."));
        assert!(stdout(&output).contains("0 created, 0 updated, 2 unchanged, 0 deleted"));
    }

    #[test]
    fn test_dry_run_and_destroy() {
        let dir = TempDir::new().unwrap();

        let output = apply(dir.path(), &["--dry-run"]);
        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(stdout(&output).contains("Plan: 2 to create, 0 to update, 0 to delete."));
        assert!(!dir.path().join("crdform.state.json").exists());

        assert!(apply(dir.path(), &[]).status.success());

        let crds = fixture("crds");
        let output = crdform_in(dir.path(), &["destroy", "--crd", &crds]);
        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(stdout(&output).contains("2 destroyed"));

        let output = crdform_in(dir.path(), &["destroy", "--crd", &crds]);
        assert!(stdout(&output).contains("No resources"));
    }

    #[test]
    fn test_invalid_resources_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("resources.yaml"), "resources:\n  - type: x\n    nmae: y\n").unwrap();

        let output = crdform_in(dir.path(), &["apply", "-f", "resources.yaml"]);
        assert_eq!(output.status.code(), Some(2));
        assert!(stderr(&output).contains("invalid YAML"));
    }
}

mod list_command {
    use super::*;

    #[test]
    fn test_list_builtins() {
        let (_dir, output) = crdform(&["list"]);

        assert!(output.status.success());
        let stdout = stdout(&output);
        assert!(stdout.contains("k8s_cert_manager_io_certificate_v1"));
        assert!(stdout.contains("k8s_helm_toolkit_fluxcd_io_helm_release_v2"));
        assert!(stdout.contains("k8s_apiextensions_crossplane_io_composition_v1"));
    }

    #[test]
    fn test_list_json_with_crds() {
        let (_dir, output) = crdform(&["list", "--json", "--crd", &fixture("crds")]);

        assert!(output.status.success());
        let json: serde_json::Value =
            serde_json::from_str(&stdout(&output)).expect("Output should be valid JSON");
        let widget = json
            .as_array()
            .unwrap()
            .iter()
            .find(|t| t["typeName"] == "k8s_example_com_widget_v1")
            .expect("widget type is registered");
        assert_eq!(widget["apiVersion"], "example.com/v1");
        assert_eq!(widget["kind"], "Widget");
        assert_eq!(widget["namespaced"], true);
    }
}

mod schema_command {
    use super::*;

    #[test]
    fn test_schema_shows_attribute_tree() {
        let (_dir, output) = crdform(&["schema", "k8s_example_com_widget_v1", "--crd", &fixture("crds")]);

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        let stdout = stdout(&output);
        assert!(stdout.contains("A widget"));
        assert!(stdout.contains("replicas int64 required"));
        assert!(stdout.contains("image_ref string optional -> imageRef"));
        assert!(stdout.contains("settings dynamic optional"));
    }
}

mod import_crd_command {
    use super::*;

    #[test]
    fn test_import_directory() {
        let (_dir, output) = crdform(&["import-crd", &fixture("crds"), "--type-prefix", "kube"]);

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        let stdout = stdout(&output);
        assert!(stdout.contains("kube_example_com_widget_v1"));
        assert!(stdout.contains("1 resource type(s)"));
    }

    #[test]
    fn test_import_invalid_crd() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("broken.yaml"),
            "kind: CustomResourceDefinition\nmetadata:\n  name: broken\n",
        )
        .unwrap();

        let output = crdform_in(dir.path(), &["import-crd", "broken.yaml"]);
        assert_eq!(output.status.code(), Some(4));
        assert!(stderr(&output).contains("broken.yaml"));
    }
}

mod configuration {
    use super::*;

    #[test]
    fn test_local_config_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("crdform.yaml"),
            format!(
                "typePrefix: kube\nstatePath: state/infra.json\ncrdPaths:\n  - {}\n",
                fixture("crds")
            ),
        )
        .unwrap();

        let output = crdform_in(dir.path(), &["list"]);
        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(stdout(&output).contains("kube_example_com_widget_v1"));
    }

    #[test]
    fn test_invalid_config_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("crdform.yaml"), "typePrefix: [nope\n").unwrap();

        let output = crdform_in(dir.path(), &["list"]);
        assert_eq!(output.status.code(), Some(78));
        assert!(stderr(&output).contains("Configuration error"));
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("crdform.yaml"), "typePrefix: kube\n").unwrap();

        let output = Command::new(env!("CARGO_BIN_EXE_crdform"))
            .args(["list"])
            .current_dir(dir.path())
            .env("HOME", dir.path())
            .env("CRDFORM_TYPE_PREFIX", "cluster")
            .output()
            .expect("Failed to execute crdform");

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(stdout(&output).contains("cluster_cert_manager_io_certificate_v1"));
    }
}
