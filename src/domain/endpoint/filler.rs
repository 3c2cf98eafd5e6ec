// Rendering endpoints into literal request targets

use std::collections::{HashMap, HashSet};

use super::ast::{Endpoint, EndpointPart, METHOD_NAME, PREFIX};
use crate::error::EndpointError;

impl Endpoint {
    /// Render the endpoint for one call.
    ///
    /// Optional parts are kept when their key is in `present_keys`, then every
    /// parameter is replaced by `lookup(name)`. Values are inserted verbatim.
    pub fn fill<F>(&self, present_keys: &HashSet<String>, mut lookup: F) -> Result<String, EndpointError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let resolved = self.resolve_optionals(|key| present_keys.contains(key));

        let mut value_of = |part: &EndpointPart| -> Result<String, EndpointError> {
            match part {
                EndpointPart::Static(text) => Ok(text.clone()),
                EndpointPart::Parameter(name) => {
                    lookup(name).ok_or_else(|| EndpointError::MissingArgument { name: name.clone() })
                }
                EndpointPart::Optional { key, .. } => {
                    unreachable!("optional part '{}' survived resolve_optionals", key)
                }
            }
        };

        let mut segments = Vec::with_capacity(resolved.url_parts.len());
        for part in &resolved.url_parts {
            segments.push(value_of(part)?);
        }

        let mut entries = Vec::with_capacity(resolved.query_params.len());
        for (key, part) in &resolved.query_params {
            entries.push(format!("{}={}", key, value_of(part)?));
        }

        let mut target = segments.join("/");
        if !entries.is_empty() {
            target.push('?');
            target.push_str(&entries.join("&"));
        }
        Ok(target)
    }

    /// Render with values from a method's declared arguments.
    ///
    /// Every parameter must name a known argument, checked before anything is looked
    /// up. Each argument is looked up at most once.
    pub fn fill_with_args<F>(
        &self,
        method_name: &str,
        known_argument_names: &HashSet<String>,
        used_optional_keys: &HashSet<String>,
        get_value: F,
    ) -> Result<String, EndpointError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        self.check_parameters(method_name, known_argument_names)?;
        self.fill_memoized(used_optional_keys, get_value)
    }

    /// Fail with `UnknownParameter` on the first parameter not in `known_argument_names`
    pub fn check_parameters(
        &self,
        method_name: &str,
        known_argument_names: &HashSet<String>,
    ) -> Result<(), EndpointError> {
        match self
            .referenced_parameters()
            .into_iter()
            .find(|name| !known_argument_names.contains(name))
        {
            Some(unknown) => Err(EndpointError::UnknownParameter {
                method: method_name.to_string(),
                name: unknown,
            }),
            None => Ok(()),
        }
    }

    /// `fill` that calls `get_value` at most once per name. No parameter check.
    pub fn fill_memoized<F>(
        &self,
        used_optional_keys: &HashSet<String>,
        mut get_value: F,
    ) -> Result<String, EndpointError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut cache: HashMap<String, Option<String>> = HashMap::new();
        self.fill(used_optional_keys, |name| {
            cache
                .entry(name.to_string())
                .or_insert_with(|| get_value(name))
                .clone()
        })
    }

    /// Substitute the method name and routing prefix, leaving other parameters alone.
    ///
    /// A substituted path value containing `/` becomes one static part per segment.
    pub fn with_static(&self, method_name: &str, prefix: &str) -> Endpoint {
        let substitute = |name: &str| match name {
            METHOD_NAME => Some(method_name),
            PREFIX => Some(prefix),
            _ => None,
        };

        let url_parts = self
            .url_parts
            .iter()
            .flat_map(|part| static_path_parts(part, &substitute))
            .collect();
        let query_params = self
            .query_params
            .iter()
            .map(|(key, part)| (key.clone(), static_query_part(part, &substitute)))
            .collect();

        Endpoint::new(url_parts, query_params)
    }
}

fn static_path_parts<'v>(
    part: &EndpointPart,
    substitute: &impl Fn(&str) -> Option<&'v str>,
) -> Vec<EndpointPart> {
    match part {
        EndpointPart::Parameter(name) => match substitute(name) {
            Some(value) => value
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(|segment| EndpointPart::Static(segment.to_string()))
                .collect(),
            None => vec![part.clone()],
        },
        EndpointPart::Static(_) => vec![part.clone()],
        EndpointPart::Optional { key, part } => static_path_parts(part, substitute)
            .into_iter()
            .map(|inner| EndpointPart::optional(key, inner))
            .collect(),
    }
}

fn static_query_part<'v>(
    part: &EndpointPart,
    substitute: &impl Fn(&str) -> Option<&'v str>,
) -> EndpointPart {
    match part {
        EndpointPart::Parameter(name) => match substitute(name) {
            Some(value) => EndpointPart::Static(value.to_string()),
            None => part.clone(),
        },
        EndpointPart::Static(_) => part.clone(),
        EndpointPart::Optional { key, part } => {
            EndpointPart::optional(key, static_query_part(part, substitute))
        }
    }
}
