// Method registry - registration records and inbound routing

use once_cell::sync::OnceCell;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::{
    domain::{
        endpoint::{
            Endpoint, EndpointParser, EndpointResolveTree, ResolveLeaf, DEFAULT_ENDPOINT,
            EXTENSION_RECEIVER, INSTANCE_RECEIVER,
        },
        request::UrlRequest,
    },
    error::{EndpointError, RequestError},
};

/// Registration record for one declared method
#[derive(Debug)]
pub struct MethodRoute {
    name: String,
    argument_names: HashSet<String>,
    endpoint: Endpoint,
    tree: OnceCell<EndpointResolveTree>,
}

impl MethodRoute {
    /// Parse `template`, substitute the method name and prefix, and check that every
    /// parameter is a declared argument.
    pub fn new(
        name: &str,
        template: &str,
        prefix: &str,
        arguments: &[String],
    ) -> Result<Self, EndpointError> {
        let endpoint = EndpointParser::parse(template)?.with_static(name, prefix);

        let mut argument_names: HashSet<String> = arguments.iter().cloned().collect();
        argument_names.insert(INSTANCE_RECEIVER.to_string());
        argument_names.insert(EXTENSION_RECEIVER.to_string());

        endpoint.check_parameters(name, &argument_names)?;

        Ok(Self {
            name: name.to_string(),
            argument_names,
            endpoint,
            tree: OnceCell::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared arguments plus the receiver placeholders
    pub fn argument_names(&self) -> &HashSet<String> {
        &self.argument_names
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Built on first use and shared afterwards
    pub fn resolve_tree(&self) -> &EndpointResolveTree {
        self.tree
            .get_or_init(|| EndpointResolveTree::build(&self.endpoint))
    }

    /// Render an outbound target. `present` names the arguments that are non-null.
    ///
    /// Parameters were checked against the declared arguments at registration.
    pub fn fill<F>(&self, present: &HashSet<String>, get_value: F) -> Result<String, EndpointError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        self.endpoint.fill_memoized(present, get_value)
    }

    pub fn resolve(&self, request: &UrlRequest) -> Option<HashMap<String, String>> {
        self.resolve_tree().resolve(request)
    }

    /// Every shape of this method's endpoint. Diagnostics only.
    pub fn enumerate(&self) -> BTreeSet<ResolveLeaf> {
        self.resolve_tree().enumerate()
    }
}

/// A request matched to a method, with the recovered argument values
#[derive(Debug)]
pub struct RouteMatch<'a> {
    pub method: &'a MethodRoute,
    pub arguments: HashMap<String, String>,
}

/// All methods served under one routing prefix, in registration order
#[derive(Debug, Default)]
pub struct MethodRegistry {
    prefix: String,
    methods: Vec<MethodRoute>,
    by_name: HashMap<String, usize>,
}

impl MethodRegistry {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            methods: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Register a method. Without a template the method uses `DEFAULT_ENDPOINT`.
    pub fn register(
        &mut self,
        name: &str,
        template: Option<&str>,
        arguments: &[String],
    ) -> Result<&MethodRoute, EndpointError> {
        if self.by_name.contains_key(name) {
            return Err(EndpointError::DuplicateMethod {
                name: name.to_string(),
            });
        }

        let route = MethodRoute::new(
            name,
            template.unwrap_or(DEFAULT_ENDPOINT),
            &self.prefix,
            arguments,
        )?;
        tracing::info!(method = %name, endpoint = %route.endpoint, "Registered method");

        let index = self.methods.len();
        self.methods.push(route);
        self.by_name.insert(name.to_string(), index);
        Ok(&self.methods[index])
    }

    pub fn get(&self, name: &str) -> Option<&MethodRoute> {
        self.by_name.get(name).map(|&index| &self.methods[index])
    }

    pub fn methods(&self) -> &[MethodRoute] {
        &self.methods
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Find the first method, in registration order, whose endpoint matches
    pub fn route(&self, request: &UrlRequest) -> Option<RouteMatch<'_>> {
        let matched = self.methods.iter().find_map(|method| {
            method
                .resolve(request)
                .map(|arguments| RouteMatch { method, arguments })
        });
        if matched.is_none() {
            tracing::debug!(request = %request, "No method matched request");
        }
        matched
    }

    /// Decompose a raw target and route it
    pub fn route_target(&self, target: &str) -> Result<Option<RouteMatch<'_>>, RequestError> {
        let request = UrlRequest::parse(target)?;
        Ok(self.route(&request))
    }
}
