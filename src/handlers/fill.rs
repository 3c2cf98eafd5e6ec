use anyhow::Result;
use std::collections::HashSet;

use super::{find_method, parse_assignments};
use crate::services::registry::MethodRegistry;

/// Render the request target for `method`.
///
/// Arguments not given are treated as null. Values are percent-encoded unless `raw`.
pub fn fill(registry: &MethodRegistry, method: &str, assignments: &[String], raw: bool) -> Result<String> {
    let route = find_method(registry, method)?;
    let values = parse_assignments(assignments)?;
    let present: HashSet<String> = values.keys().cloned().collect();

    let target = route.fill(&present, |name| {
        values.get(name).map(|value| {
            if raw {
                value.clone()
            } else {
                urlencoding::encode(value).into_owned()
            }
        })
    })?;
    Ok(target)
}
