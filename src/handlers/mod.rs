// Subcommand handlers for the diagnostic CLI
//
// Handlers return their output as text so they can be tested without a terminal.
// Value encoding lives here, outside the engine.

pub mod fill;
pub mod resolve;
pub mod shapes;

use anyhow::{bail, Context, Result};
use std::collections::HashMap;

use crate::services::registry::{MethodRegistry, MethodRoute};

/// Parse `name=value` assignments given on the command line
pub fn parse_assignments(assignments: &[String]) -> Result<HashMap<String, String>> {
    let mut values = HashMap::new();
    for assignment in assignments {
        let Some((name, value)) = assignment.split_once('=') else {
            bail!("Invalid argument '{}': expected 'name=value'", assignment);
        };
        if name.is_empty() {
            bail!("Invalid argument '{}': empty name", assignment);
        }
        if values.insert(name.to_string(), value.to_string()).is_some() {
            bail!("Argument '{}' given more than once", name);
        }
    }
    Ok(values)
}

fn find_method<'a>(registry: &'a MethodRegistry, name: &str) -> Result<&'a MethodRoute> {
    registry
        .get(name)
        .with_context(|| format!("Unknown method '{}'", name))
}
