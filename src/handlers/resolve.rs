use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::services::registry::MethodRegistry;

/// A routed request, ready to print as JSON
#[derive(Debug, Serialize, PartialEq)]
pub struct ResolveOutput {
    pub method: String,
    pub arguments: BTreeMap<String, String>,
}

/// Route `target` to a method and recover its arguments.
///
/// Values are percent-decoded unless `raw`. `Ok(None)` means no method matched.
pub fn resolve(registry: &MethodRegistry, target: &str, raw: bool) -> Result<Option<ResolveOutput>> {
    let Some(matched) = registry.route_target(target)? else {
        return Ok(None);
    };

    let mut arguments = BTreeMap::new();
    for (name, value) in matched.arguments {
        let value = if raw {
            value
        } else {
            urlencoding::decode(&value)
                .with_context(|| format!("Argument '{}' is not valid UTF-8 once decoded", name))?
                .into_owned()
        };
        arguments.insert(name, value);
    }

    Ok(Some(ResolveOutput {
        method: matched.method.name().to_string(),
        arguments,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::methods::registry_from_str;

    const METHODS: &str = r#"
prefix: krosstalk
methods:
  - name: search
    endpoint: "{$prefix}/{$name}?q={q}"
    arguments: [q]
"#;

    #[test]
    fn test_resolve_decodes_values() {
        let registry = registry_from_str(METHODS).unwrap();
        let output = resolve(&registry, "/krosstalk/search?q=hello%20world", false)
            .unwrap()
            .unwrap();
        assert_eq!(output.method, "search");
        assert_eq!(output.arguments["q"], "hello world");

        let json = serde_json::to_string(&output).unwrap();
        assert_eq!(json, r#"{"method":"search","arguments":{"q":"hello world"}}"#);
    }

    #[test]
    fn test_resolve_raw_values() {
        let registry = registry_from_str(METHODS).unwrap();
        let output = resolve(&registry, "krosstalk/search?q=a%2Fb", true).unwrap().unwrap();
        assert_eq!(output.arguments["q"], "a%2Fb");
    }

    #[test]
    fn test_resolve_no_match() {
        let registry = registry_from_str(METHODS).unwrap();
        assert_eq!(resolve(&registry, "krosstalk/other", false).unwrap(), None);
    }

    #[test]
    fn test_resolve_malformed_request() {
        let registry = registry_from_str(METHODS).unwrap();
        assert!(resolve(&registry, "krosstalk/search?q", false).is_err());
    }
}
