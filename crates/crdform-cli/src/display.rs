//! Display formatting for CLI output
//!
//! Provides structured display for:
//! - Attribute trees of resource schemas
//! - Plan lines and apply summaries with action colors
//! - Manifest diffs for updated resources

use console::{Style, style};
use crdform_core::{Attribute, Presence};
use crdform_provider::PlanAction;
use similar::{ChangeTag, TextDiff};
use std::fmt::Write;

/// Symbol and style of a plan action
fn action_marker(action: PlanAction) -> (char, Style) {
    match action {
        PlanAction::Create => ('+', Style::new().green()),
        PlanAction::Update => ('~', Style::new().yellow()),
        PlanAction::NoOp => (' ', Style::new().dim()),
    }
}

/// One line of a plan: `+ k8s_..._v1.web (create)`
pub fn plan_line(action: PlanAction, address: &str) -> String {
    let (symbol, style) = action_marker(action);
    format!("{} {} {}", style.apply_to(symbol), address, style.apply_to(format!("({})", action)))
}

/// Plan line of a resource that is no longer declared
pub fn delete_line(address: &str) -> String {
    format!("{} {} {}", style('-').red(), address, style("(delete)").red())
}

/// Line diff of two manifests, empty when they are equal
pub fn manifest_diff(old: &str, new: &str) -> String {
    let mut out = String::new();
    if old == new {
        return out;
    }

    let diff = TextDiff::from_lines(old, new);

    for change in diff.iter_all_changes() {
        let line = change.value().trim_end();
        let _ = match change.tag() {
            ChangeTag::Delete => writeln!(out, "    {}", style(format!("- {}", line)).red()),
            ChangeTag::Insert => writeln!(out, "    {}", style(format!("+ {}", line)).green()),
            ChangeTag::Equal => writeln!(out, "    {}", style(format!("  {}", line)).dim()),
        };
    }
    out
}

/// Counts of what an apply did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ApplySummary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub deleted: usize,
}

impl ApplySummary {
    pub fn record(&mut self, action: PlanAction) {
        match action {
            PlanAction::Create => self.created += 1,
            PlanAction::Update => self.updated += 1,
            PlanAction::NoOp => self.unchanged += 1,
        }
    }

    pub fn has_changes(&self) -> bool {
        self.created + self.updated + self.deleted > 0
    }

    /// `Plan: 1 to create, 0 to update, 1 to delete.`
    pub fn plan_text(&self) -> String {
        format!(
            "Plan: {} to create, {} to update, {} to delete.",
            self.created, self.updated, self.deleted
        )
    }

    /// `Apply complete! Resources: 1 created, 0 updated, 2 unchanged, 0 deleted.`
    pub fn apply_text(&self) -> String {
        format!(
            "Apply complete! Resources: {} created, {} updated, {} unchanged, {} deleted.",
            self.created, self.updated, self.unchanged, self.deleted
        )
    }
}

/// Indented attribute tree of a schema
pub fn attribute_tree(attributes: &[Attribute]) -> String {
    let mut out = String::new();
    write_attributes(&mut out, attributes, 0);
    out
}

fn write_attributes(out: &mut String, attributes: &[Attribute], depth: usize) {
    for attribute in attributes {
        let indent = "  ".repeat(depth);
        let presence = match attribute.presence {
            Presence::Required => style(attribute.presence).red(),
            Presence::Optional => style(attribute.presence).dim(),
            Presence::Computed => style(attribute.presence).cyan(),
        };

        let _ = write!(
            out,
            "{}{} {} {}",
            indent,
            style(&attribute.name).bold(),
            style(&attribute.ty).yellow(),
            presence
        );
        if let Some(manifest_name) = attribute.manifest_name.as_deref().filter(|m| *m != attribute.name) {
            let _ = write!(out, " {}", style(format!("-> {}", manifest_name)).dim());
        }
        if let Some(description) = attribute.description.as_deref().and_then(|d| d.lines().next()) {
            let _ = write!(out, "  {}", style(format!("# {}", description)).dim());
        }
        out.push('\n');

        if let Some(nested) = attribute.ty.nested() {
            write_attributes(out, nested, depth + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_diff() {
        console::set_colors_enabled(false);

        let old = "id: \"1\"\nspec:\n  replicas: 2\n";
        let new = "id: \"2\"\nspec:\n  replicas: 3\n";
        let diff = manifest_diff(old, new);

        assert!(diff.contains("- id: \"1\""));
        assert!(diff.contains("+ id: \"2\""));
        assert!(diff.contains("    spec:"));
        assert!(diff.contains("+   replicas: 3"));
        assert!(manifest_diff(old, old).is_empty());
    }

    #[test]
    fn test_summary_text() {
        let mut summary = ApplySummary::default();
        summary.record(PlanAction::Create);
        summary.record(PlanAction::NoOp);
        summary.deleted = 2;

        assert!(summary.has_changes());
        assert_eq!(summary.plan_text(), "Plan: 1 to create, 0 to update, 2 to delete.");
        assert_eq!(
            summary.apply_text(),
            "Apply complete! Resources: 1 created, 0 updated, 1 unchanged, 2 deleted."
        );
    }

    #[test]
    fn test_attribute_tree() {
        console::set_colors_enabled(false);

        let attributes = vec![
            Attribute::string("id").computed(),
            Attribute::object(
                "spec",
                vec![
                    Attribute::int64("replicas").required(),
                    Attribute::bool("is_ca").rendered_as("isCA").describe("Issue a CA certificate\nmore"),
                ],
            ),
        ];

        assert_eq!(
            attribute_tree(&attributes),
            "id string computed\n\
             spec object optional\n  \
               replicas int64 required\n  \
               is_ca bool optional -> isCA  # Issue a CA certificate\n"
        );
    }
}
