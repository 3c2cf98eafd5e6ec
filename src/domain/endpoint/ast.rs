// Structured form of an endpoint template

use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Method name placeholder, substituted by `Endpoint::with_static`
pub const METHOD_NAME: &str = "$name";
/// Routing prefix placeholder, substituted by `Endpoint::with_static`
pub const PREFIX: &str = "$prefix";
pub const INSTANCE_RECEIVER: &str = "$instanceReceiver";
pub const EXTENSION_RECEIVER: &str = "$extensionReceiver";

/// Chunks that are parameters even when written without braces
pub const RESERVED_PARAMETERS: [&str; 4] =
    [METHOD_NAME, PREFIX, INSTANCE_RECEIVER, EXTENSION_RECEIVER];

/// Template used when a method declares no endpoint of its own
pub const DEFAULT_ENDPOINT: &str = "{$prefix}/{$name}";

/// One path segment or one query value of a template
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EndpointPart {
    Static(String),
    Parameter(String),
    /// Present only when `key` is present
    Optional { key: String, part: Box<EndpointPart> },
}

impl EndpointPart {
    pub fn optional(key: &str, part: EndpointPart) -> Self {
        EndpointPart::Optional {
            key: key.to_string(),
            part: Box::new(part),
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, EndpointPart::Optional { .. })
    }

    /// Drop the part if an enclosing key is absent, unwrap it otherwise
    pub fn resolve_optionals(&self, is_present: &impl Fn(&str) -> bool) -> Option<EndpointPart> {
        match self {
            EndpointPart::Optional { key, part } => {
                if is_present(key) {
                    part.resolve_optionals(is_present)
                } else {
                    None
                }
            }
            other => Some(other.clone()),
        }
    }

    fn collect_parameters<'a>(&'a self, seen: &mut HashSet<&'a str>, out: &mut Vec<String>) {
        match self {
            EndpointPart::Static(_) => {}
            EndpointPart::Parameter(name) => {
                if seen.insert(name) {
                    out.push(name.clone());
                }
            }
            EndpointPart::Optional { part, .. } => part.collect_parameters(seen, out),
        }
    }

    fn collect_keys<'a>(&'a self, seen: &mut HashSet<&'a str>, out: &mut Vec<String>) {
        if let EndpointPart::Optional { key, part } = self {
            if seen.insert(key) {
                out.push(key.clone());
            }
            part.collect_keys(seen, out);
        }
    }

    /// The innermost static or parameter part, and the keys wrapping it outermost first
    fn unwrap_keys(&self) -> (Vec<&str>, &EndpointPart) {
        let mut keys = Vec::new();
        let mut current = self;
        while let EndpointPart::Optional { key, part } = current {
            keys.push(key.as_str());
            current = part;
        }
        (keys, current)
    }

    fn fmt_leaf(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointPart::Static(text) => write!(f, "{}", text),
            EndpointPart::Parameter(name) => write!(f, "{{{}}}", name),
            EndpointPart::Optional { .. } => Ok(()),
        }
    }
}

/// A parsed endpoint template: ordered path parts and keyed query parts
#[derive(Debug, Clone, Default)]
pub struct Endpoint {
    pub url_parts: Vec<EndpointPart>,
    pub query_params: Vec<(String, EndpointPart)>,
}

impl Endpoint {
    pub fn new(url_parts: Vec<EndpointPart>, query_params: Vec<(String, EndpointPart)>) -> Self {
        Self {
            url_parts,
            query_params,
        }
    }

    pub fn query_param(&self, key: &str) -> Option<&EndpointPart> {
        self.query_params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, part)| part)
    }

    pub fn has_optionals(&self) -> bool {
        self.url_parts.iter().any(EndpointPart::is_optional)
            || self.query_params.iter().any(|(_, part)| part.is_optional())
    }

    /// Every parameter name used anywhere in the template, in first-appearance order
    pub fn referenced_parameters(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for part in self.all_parts() {
            part.collect_parameters(&mut seen, &mut names);
        }
        names
    }

    /// Every key that guards an optional block
    pub fn optional_keys(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        for part in self.all_parts() {
            part.collect_keys(&mut seen, &mut keys);
        }
        keys
    }

    /// Drop optional parts whose key is absent and unwrap the rest
    pub fn resolve_optionals(&self, is_present: impl Fn(&str) -> bool) -> Endpoint {
        let url_parts = self
            .url_parts
            .iter()
            .filter_map(|part| part.resolve_optionals(&is_present))
            .collect();
        let query_params = self
            .query_params
            .iter()
            .filter_map(|(key, part)| {
                part.resolve_optionals(&is_present)
                    .map(|part| (key.clone(), part))
            })
            .collect();
        Endpoint::new(url_parts, query_params)
    }

    fn all_parts(&self) -> impl Iterator<Item = &EndpointPart> {
        self.url_parts
            .iter()
            .chain(self.query_params.iter().map(|(_, part)| part))
    }

    fn sorted_query(&self) -> BTreeMap<&str, &EndpointPart> {
        self.query_params
            .iter()
            .map(|(key, part)| (key.as_str(), part))
            .collect()
    }
}

// Query order only matters when rendering
impl PartialEq for Endpoint {
    fn eq(&self, other: &Self) -> bool {
        self.url_parts == other.url_parts && self.sorted_query() == other.sorted_query()
    }
}

impl Eq for Endpoint {}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.url_parts.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            let (keys, leaf) = part.unwrap_keys();
            for key in &keys {
                write!(f, "[?{}:", key)?;
            }
            leaf.fmt_leaf(f)?;
            for _ in &keys {
                write!(f, "]")?;
            }
        }

        for (i, (name, part)) in self.query_params.iter().enumerate() {
            write!(f, "{}", if i == 0 { "?" } else { "&" })?;
            let (keys, leaf) = part.unwrap_keys();
            for key in &keys {
                write!(f, "[?{}:", key)?;
            }
            write!(f, "{}=", name)?;
            leaf.fmt_leaf(f)?;
            for _ in &keys {
                write!(f, "]")?;
            }
        }

        Ok(())
    }
}
