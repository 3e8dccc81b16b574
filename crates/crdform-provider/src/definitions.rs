//! Built-in resource definitions
//!
//! Hand-declared schemas for a few widely used custom resources. They are the
//! same kind of data that CRD import produces and go through the same
//! lifecycle.

use crdform_core::{Attribute, AttributeType, Schema, Validator};
use crdform_engine::ResourceIdentity;

use crate::resource::ResourceDefinition;

/// Every built-in definition
pub fn builtin_definitions() -> Vec<ResourceDefinition> {
    vec![certificate_v1(), helm_release_v2(), composition_v1()]
}

/// cert-manager `Certificate`
pub fn certificate_v1() -> ResourceDefinition {
    let spec = Attribute::object(
        "spec",
        vec![
            Attribute::string("secret_name")
                .required()
                .describe("Name of the Secret that will hold the issued certificate")
                .validate(Validator::Dns1123Subdomain),
            Attribute::object(
                "issuer_ref",
                vec![
                    Attribute::string("name").required(),
                    Attribute::string("kind"),
                    Attribute::string("group"),
                ],
            )
            .required()
            .describe("Issuer that signs the certificate"),
            Attribute::string("common_name").validate(Validator::Length { min: None, max: Some(64) }),
            Attribute::string_list("dns_names"),
            Attribute::string_list("ip_addresses"),
            Attribute::string_list("uris"),
            Attribute::string_list("email_addresses"),
            Attribute::string("duration").describe("Requested lifetime, e.g. 2160h"),
            Attribute::string("renew_before"),
            Attribute::bool("is_ca").rendered_as("isCA"),
            Attribute::string_list("usages"),
            Attribute::int64("revision_history_limit").validate(Validator::Range {
                min: Some(1.0),
                max: None,
            }),
            Attribute::object(
                "private_key",
                vec![
                    Attribute::string("algorithm").validate(Validator::one_of(["RSA", "ECDSA", "Ed25519"])),
                    Attribute::string("encoding").validate(Validator::one_of(["PKCS1", "PKCS8"])),
                    Attribute::int64("size"),
                    Attribute::string("rotation_policy").validate(Validator::one_of(["Never", "Always"])),
                ],
            ),
            Attribute::object(
                "secret_template",
                vec![Attribute::string_map("annotations"), Attribute::string_map("labels")],
            ),
            Attribute::object(
                "subject",
                vec![
                    Attribute::string_list("organizations"),
                    Attribute::string_list("organizational_units"),
                    Attribute::string_list("countries"),
                    Attribute::string_list("localities"),
                ],
            ),
        ],
    )
    .required();

    ResourceDefinition::new(
        ResourceIdentity::new("cert-manager.io/v1", "Certificate"),
        true,
        Schema::custom_resource("A certificate issued by cert-manager", true).with_attribute(spec),
    )
}

/// Flux `HelmRelease`
pub fn helm_release_v2() -> ResourceDefinition {
    let crds_policy = || Validator::one_of(["Skip", "Create", "CreateReplace"]);

    let chart = Attribute::object(
        "chart",
        vec![
            Attribute::object(
                "spec",
                vec![
                    Attribute::string("chart").required(),
                    Attribute::string("version"),
                    Attribute::object(
                        "source_ref",
                        vec![
                            Attribute::string("kind")
                                .required()
                                .validate(Validator::one_of(["HelmRepository", "GitRepository", "Bucket"])),
                            Attribute::string("name").required(),
                            Attribute::string("namespace"),
                        ],
                    )
                    .required(),
                    Attribute::string("interval"),
                    Attribute::string("reconcile_strategy")
                        .validate(Validator::one_of(["ChartVersion", "Revision"])),
                    Attribute::string_list("values_files"),
                ],
            )
            .required(),
        ],
    )
    .describe("Chart template to create a HelmChart from");

    let spec = Attribute::object(
        "spec",
        vec![
            chart,
            Attribute::object(
                "chart_ref",
                vec![
                    Attribute::string("kind")
                        .required()
                        .validate(Validator::one_of(["OCIRepository", "HelmChart"])),
                    Attribute::string("name").required(),
                    Attribute::string("namespace"),
                ],
            ),
            Attribute::string("interval")
                .required()
                .describe("How often the release is reconciled"),
            Attribute::string("release_name").validate(Validator::Length { min: Some(1), max: Some(53) }),
            Attribute::string("target_namespace").validate(Validator::Length { min: Some(1), max: Some(63) }),
            Attribute::string("storage_namespace").validate(Validator::Length { min: Some(1), max: Some(63) }),
            Attribute::bool("suspend"),
            Attribute::string("timeout"),
            Attribute::int64("max_history"),
            Attribute::string("service_account_name"),
            Attribute::object_list(
                "depends_on",
                vec![Attribute::string("name").required(), Attribute::string("namespace")],
            ),
            Attribute::object(
                "install",
                vec![
                    Attribute::bool("create_namespace"),
                    Attribute::string("crds").validate(crds_policy()),
                    Attribute::object("remediation", vec![Attribute::int64("retries")]),
                ],
            ),
            Attribute::object(
                "upgrade",
                vec![
                    Attribute::string("crds").validate(crds_policy()),
                    Attribute::object(
                        "remediation",
                        vec![
                            Attribute::int64("retries"),
                            Attribute::bool("remediate_last_failure"),
                        ],
                    ),
                ],
            ),
            Attribute::dynamic("values").describe("Values passed to the chart, kept verbatim"),
            Attribute::object_list(
                "values_from",
                vec![
                    Attribute::string("kind")
                        .required()
                        .validate(Validator::one_of(["Secret", "ConfigMap"])),
                    Attribute::string("name").required(),
                    Attribute::string("values_key"),
                    Attribute::string("target_path"),
                    Attribute::bool("optional"),
                ],
            ),
            Attribute::new("post_renderers", AttributeType::list_of(AttributeType::Dynamic)),
            Attribute::object(
                "kube_config",
                vec![
                    Attribute::object(
                        "secret_ref",
                        vec![Attribute::string("name").required(), Attribute::string("key")],
                    )
                    .required(),
                ],
            )
            .describe("Secret holding a kubeconfig for a remote cluster"),
        ],
    )
    .required();

    ResourceDefinition::new(
        ResourceIdentity::new("helm.toolkit.fluxcd.io/v2", "HelmRelease"),
        true,
        Schema::custom_resource("A Helm release reconciled by Flux", true).with_attribute(spec),
    )
}

/// Crossplane `Composition`
pub fn composition_v1() -> ResourceDefinition {
    let dynamic_list = |name: &str| Attribute::new(name, AttributeType::list_of(AttributeType::Dynamic));

    let spec = Attribute::object(
        "spec",
        vec![
            Attribute::object(
                "composite_type_ref",
                vec![
                    Attribute::string("api_version").required(),
                    Attribute::string("kind").required(),
                ],
            )
            .required()
            .describe("Composite resource type this composition satisfies"),
            Attribute::string("mode").validate(Validator::one_of(["Resources", "Pipeline"])),
            Attribute::object_list(
                "resources",
                vec![
                    Attribute::string("name"),
                    Attribute::dynamic("base")
                        .required()
                        .describe("Template of the composed resource, kept verbatim"),
                    dynamic_list("patches"),
                    dynamic_list("connection_details"),
                    dynamic_list("readiness_checks"),
                ],
            ),
            Attribute::object_list(
                "pipeline",
                vec![
                    Attribute::string("step").required(),
                    Attribute::object("function_ref", vec![Attribute::string("name").required()]).required(),
                    Attribute::dynamic("input"),
                    dynamic_list("credentials"),
                ],
            ),
            Attribute::object_list(
                "patch_sets",
                vec![
                    Attribute::string("name").required(),
                    dynamic_list("patches").required(),
                ],
            ),
            Attribute::string("write_connection_secrets_to_namespace"),
            Attribute::object(
                "publish_connection_details_with_store_config_ref",
                vec![Attribute::string("name")],
            ),
        ],
    )
    .required();

    ResourceDefinition::new(
        ResourceIdentity::new("apiextensions.crossplane.io/v1", "Composition"),
        false,
        Schema::custom_resource("A Crossplane composition", false).with_attribute(spec),
    )
}
