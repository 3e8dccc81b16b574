//! Import CRD command - show resource types generated from CRD files

use console::style;
use std::path::PathBuf;

use super::load_crd_path;
use crate::config::Settings;
use crate::display;
use crate::error::Result;

pub fn run(settings: &Settings, paths: &[PathBuf]) -> Result<()> {
    let mut count = 0;

    for path in paths {
        for definition in load_crd_path(path)? {
            let scope = if definition.namespaced { "Namespaced" } else { "Cluster" };
            println!(
                "{} {} {}",
                style(definition.type_name(&settings.type_prefix)).cyan().bold(),
                style(&definition.identity).dim(),
                style(scope).dim()
            );
            print!("{}", display::attribute_tree(&definition.schema.attributes));
            println!();
            count += 1;
        }
    }

    if count == 0 {
        println!("{}", style("No CustomResourceDefinitions found").yellow());
    } else {
        println!("{} {} resource type(s)", style("✓").green().bold(), count);
    }

    Ok(())
}
