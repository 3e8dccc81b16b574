//! Schema command - show the attribute tree of a resource type

use console::style;

use super::build_provider;
use crate::config::Settings;
use crate::display;
use crate::error::Result;

pub fn run(settings: &Settings, type_name: &str) -> Result<()> {
    let provider = build_provider(settings)?;
    let resource = provider.resource(type_name)?;

    println!("{} {}", style(resource.type_name()).cyan().bold(), style(resource.identity()).dim());
    if let Some(description) = &resource.schema().description {
        println!("{}", description);
    }
    println!();
    print!("{}", display::attribute_tree(&resource.schema().attributes));

    Ok(())
}
