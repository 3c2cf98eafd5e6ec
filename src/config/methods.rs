use anyhow::{Context, Result};

use crate::{config::yml_settings::YmlSettings, services::registry::MethodRegistry};

pub const DEFAULT_CONFIG_FILE: &str = "methods.yml";

/// Build a registry from YAML settings. Any invalid method aborts loading.
pub fn registry_from_settings(settings: YmlSettings) -> Result<MethodRegistry> {
    let mut registry = MethodRegistry::new(&settings.prefix);
    for method in &settings.methods {
        registry
            .register(&method.name, method.endpoint.as_deref(), &method.arguments)
            .with_context(|| format!("Invalid declaration for method '{}'", method.name))?;
    }
    Ok(registry)
}

pub fn registry_from_str(yml: &str) -> Result<MethodRegistry> {
    let settings: YmlSettings =
        serde_yaml::from_str(yml).context("Invalid yaml configuration")?;
    registry_from_settings(settings)
}

/// Load the methods file at `path`, or `methods.yml` when none is given
pub fn load_registry(path: Option<&str>) -> Result<MethodRegistry> {
    let path = path.unwrap_or(DEFAULT_CONFIG_FILE);
    let yml = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read methods file '{}'", path))?;
    let registry = registry_from_str(&yml)?;
    tracing::info!(path = %path, methods = registry.len(), "Loaded methods");
    Ok(registry)
}
