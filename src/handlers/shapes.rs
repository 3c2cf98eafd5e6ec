use anyhow::Result;

use super::find_method;
use crate::services::registry::MethodRegistry;

/// One line per enumerated shape of `method`, with the keys that select it
pub fn shapes(registry: &MethodRegistry, method: &str) -> Result<Vec<String>> {
    let route = find_method(registry, method)?;

    let lines = route
        .enumerate()
        .into_iter()
        .map(|leaf| {
            let taken: Vec<&str> = leaf.taken_keys.iter().map(String::as_str).collect();
            let untaken: Vec<&str> = leaf.untaken_keys.iter().map(String::as_str).collect();
            format!(
                "{}  present=[{}] absent=[{}]",
                leaf.endpoint,
                taken.join(","),
                untaken.join(",")
            )
        })
        .collect();
    Ok(lines)
}
