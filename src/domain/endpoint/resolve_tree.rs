// Compiled matching tree for inbound request targets
//
// An endpoint with optional blocks denotes a family of concrete shapes. The tree
// shares the positional prefix common to several shapes and only branches where an
// optional key is first decided, so matching does not walk every shape.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt;

use super::ast::{Endpoint, EndpointPart};
use crate::domain::request::UrlRequest;

/// A path part with every optional resolved away
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResolveUrlPart {
    Static(String),
    Param(String),
}

impl ResolveUrlPart {
    fn bind(&self, segment: &str, bound: &mut HashMap<String, String>) -> bool {
        match self {
            ResolveUrlPart::Static(text) => text == segment,
            ResolveUrlPart::Param(name) => bind_value(bound, name, segment),
        }
    }
}

/// Record `name = value`. A name already bound to another value fails the match.
fn bind_value(bound: &mut HashMap<String, String>, name: &str, value: &str) -> bool {
    match bound.get(name) {
        Some(existing) => existing == value,
        None => {
            bound.insert(name.to_string(), value.to_string());
            true
        }
    }
}

/// A query entry for one shape.
///
/// Query entries can stay optional inside a shape since a missing key does not
/// shift any other entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResolveQueryParam {
    Static { value: String, optional: bool },
    Param { name: String, optional: bool },
}

impl ResolveQueryParam {
    pub fn is_optional(&self) -> bool {
        match self {
            ResolveQueryParam::Static { optional, .. } | ResolveQueryParam::Param { optional, .. } => {
                *optional
            }
        }
    }

    fn from_part(
        part: &EndpointPart,
        taken: &BTreeSet<String>,
        untaken: &BTreeSet<String>,
        optional: bool,
    ) -> Option<Self> {
        match part {
            EndpointPart::Static(value) => Some(ResolveQueryParam::Static {
                value: value.clone(),
                optional,
            }),
            EndpointPart::Parameter(name) => Some(ResolveQueryParam::Param {
                name: name.clone(),
                optional,
            }),
            EndpointPart::Optional { key, part } => {
                if untaken.contains(key) {
                    None
                } else {
                    let still_optional = optional || !taken.contains(key);
                    Self::from_part(part, taken, untaken, still_optional)
                }
            }
        }
    }
}

/// One concrete shape of an endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResolveEndpoint {
    pub url_parts: Vec<ResolveUrlPart>,
    pub query_params: BTreeMap<String, ResolveQueryParam>,
}

impl ResolveEndpoint {
    /// Match a request against this shape alone
    pub fn resolve(&self, request: &UrlRequest) -> Option<HashMap<String, String>> {
        if request.url_parts.len() != self.url_parts.len() {
            return None;
        }
        let mut bound = self.resolve_query(&request.query_params, HashMap::new())?;
        for (part, segment) in self.url_parts.iter().zip(&request.url_parts) {
            if !part.bind(segment, &mut bound) {
                return None;
            }
        }
        Some(bound)
    }

    fn resolve_query(
        &self,
        query: &BTreeMap<String, String>,
        mut bound: HashMap<String, String>,
    ) -> Option<HashMap<String, String>> {
        for (key, param) in &self.query_params {
            let Some(value) = query.get(key) else {
                if param.is_optional() {
                    continue;
                }
                return None;
            };
            match param {
                ResolveQueryParam::Static { value: expected, .. } => {
                    if expected != value {
                        return None;
                    }
                }
                ResolveQueryParam::Param { name, .. } => {
                    if !bind_value(&mut bound, name, value) {
                        return None;
                    }
                }
            }
        }
        Some(bound)
    }
}

// Optional query entries are shown in brackets, e.g. `items/{id}?q={q}&[page={page}]`
impl fmt::Display for ResolveEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.url_parts.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            match part {
                ResolveUrlPart::Static(text) => write!(f, "{}", text)?,
                ResolveUrlPart::Param(name) => write!(f, "{{{}}}", name)?,
            }
        }
        for (i, (key, param)) in self.query_params.iter().enumerate() {
            write!(f, "{}", if i == 0 { "?" } else { "&" })?;
            let entry = match param {
                ResolveQueryParam::Static { value, .. } => format!("{}={}", key, value),
                ResolveQueryParam::Param { name, .. } => format!("{}={{{}}}", key, name),
            };
            if param.is_optional() {
                write!(f, "[{}]", entry)?;
            } else {
                write!(f, "{}", entry)?;
            }
        }
        Ok(())
    }
}

/// A terminal shape together with the optional keys decided on the way to it
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResolveLeaf {
    pub endpoint: ResolveEndpoint,
    pub taken_keys: BTreeSet<String>,
    pub untaken_keys: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointResolveTree {
    /// An undecided optional key. Children are tried in order, taken branch first.
    Fork(Vec<EndpointResolveTree>),
    /// Parts matched positionally before continuing with `next`
    Multiple {
        parts: Vec<ResolveUrlPart>,
        next: Box<EndpointResolveTree>,
    },
    Leaf(ResolveLeaf),
}

impl EndpointResolveTree {
    /// Compile an endpoint into its resolve tree
    pub fn build(endpoint: &Endpoint) -> Self {
        let builder = TreeBuilder {
            query_params: &endpoint.query_params,
        };
        let tree = builder.build(
            Vec::new(),
            Vec::new(),
            endpoint.url_parts.clone(),
            BTreeSet::new(),
            BTreeSet::new(),
        );
        tracing::debug!(endpoint = %endpoint, leaves = tree.leaf_count(), "Built resolve tree");
        tree
    }

    /// Every leaf reachable from this tree. Exponential in independent optional keys.
    pub fn enumerate(&self) -> BTreeSet<ResolveLeaf> {
        let mut leaves = BTreeSet::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    /// Distinct concrete shapes, ignoring which keys led to them
    pub fn shapes(&self) -> BTreeSet<ResolveEndpoint> {
        self.enumerate()
            .into_iter()
            .map(|leaf| leaf.endpoint)
            .collect()
    }

    /// Match a request, returning the bound parameter values of the first matching shape
    pub fn resolve(&self, request: &UrlRequest) -> Option<HashMap<String, String>> {
        self.resolve_from(&request.url_parts, &request.query_params, &HashMap::new())
    }

    /// `bound` holds the values bound above this node; each branch extends its own copy
    fn resolve_from(
        &self,
        segments: &[String],
        query: &BTreeMap<String, String>,
        bound: &HashMap<String, String>,
    ) -> Option<HashMap<String, String>> {
        match self {
            EndpointResolveTree::Fork(options) => options
                .iter()
                .find_map(|option| option.resolve_from(segments, query, bound)),
            EndpointResolveTree::Multiple { parts, next } => {
                if segments.len() < parts.len() {
                    return None;
                }
                let mut bound = bound.clone();
                for (part, segment) in parts.iter().zip(segments) {
                    if !part.bind(segment, &mut bound) {
                        return None;
                    }
                }
                next.resolve_from(&segments[parts.len()..], query, &bound)
            }
            EndpointResolveTree::Leaf(leaf) => {
                if !segments.is_empty() {
                    return None;
                }
                leaf.endpoint.resolve_query(query, bound.clone())
            }
        }
    }

    fn collect_leaves(&self, leaves: &mut BTreeSet<ResolveLeaf>) {
        match self {
            EndpointResolveTree::Fork(options) => {
                for option in options {
                    option.collect_leaves(leaves);
                }
            }
            EndpointResolveTree::Multiple { next, .. } => next.collect_leaves(leaves),
            EndpointResolveTree::Leaf(leaf) => {
                leaves.insert(leaf.clone());
            }
        }
    }

    fn leaf_count(&self) -> usize {
        match self {
            EndpointResolveTree::Fork(options) => options.iter().map(Self::leaf_count).sum(),
            EndpointResolveTree::Multiple { next, .. } => next.leaf_count(),
            EndpointResolveTree::Leaf(_) => 1,
        }
    }

    fn with_prefix(prefix: Vec<ResolveUrlPart>, tree: EndpointResolveTree) -> Self {
        if prefix.is_empty() {
            tree
        } else {
            EndpointResolveTree::Multiple {
                parts: prefix,
                next: Box::new(tree),
            }
        }
    }

    /// Options of a fork child, with nested forks spliced in
    fn into_options(self) -> Vec<EndpointResolveTree> {
        match self {
            EndpointResolveTree::Fork(options) => options,
            other => vec![other],
        }
    }
}

struct TreeBuilder<'a> {
    query_params: &'a [(String, EndpointPart)],
}

impl TreeBuilder<'_> {
    fn build(
        &self,
        full_prefix: Vec<ResolveUrlPart>,
        mut current_prefix: Vec<ResolveUrlPart>,
        rest: Vec<EndpointPart>,
        taken: BTreeSet<String>,
        mut untaken: BTreeSet<String>,
    ) -> EndpointResolveTree {
        let mut rest = VecDeque::from(rest);

        // No optionals left: everything remaining is positional
        if rest.iter().all(|part| !part.is_optional()) {
            current_prefix.extend(rest.into_iter().filter_map(|part| match part {
                EndpointPart::Static(text) => Some(ResolveUrlPart::Static(text)),
                EndpointPart::Parameter(name) => Some(ResolveUrlPart::Param(name)),
                EndpointPart::Optional { .. } => None,
            }));
            return self.leaf(full_prefix, current_prefix, taken, untaken);
        }

        while let Some(part) = rest.pop_front() {
            match part {
                EndpointPart::Static(text) => current_prefix.push(ResolveUrlPart::Static(text)),
                EndpointPart::Parameter(name) => current_prefix.push(ResolveUrlPart::Param(name)),
                EndpointPart::Optional { key, part } => {
                    if taken.contains(&key) {
                        rest.push_front(*part);
                        continue;
                    }
                    if untaken.contains(&key) {
                        continue;
                    }

                    let mut branch_prefix = full_prefix;
                    branch_prefix.extend(current_prefix.iter().cloned());

                    let mut taken_rest: Vec<EndpointPart> = vec![*part];
                    taken_rest.extend(rest.iter().cloned());
                    let mut taken_with_key = taken.clone();
                    taken_with_key.insert(key.clone());
                    let taken_tree = self.build(
                        branch_prefix.clone(),
                        Vec::new(),
                        taken_rest,
                        taken_with_key,
                        untaken.clone(),
                    );

                    untaken.insert(key);
                    let untaken_tree = self.build(
                        branch_prefix,
                        Vec::new(),
                        rest.into_iter().collect(),
                        taken,
                        untaken,
                    );

                    let mut options = taken_tree.into_options();
                    options.extend(untaken_tree.into_options());
                    return EndpointResolveTree::with_prefix(
                        current_prefix,
                        EndpointResolveTree::Fork(options),
                    );
                }
            }
        }

        self.leaf(full_prefix, current_prefix, taken, untaken)
    }

    fn leaf(
        &self,
        mut full_prefix: Vec<ResolveUrlPart>,
        current_prefix: Vec<ResolveUrlPart>,
        taken: BTreeSet<String>,
        untaken: BTreeSet<String>,
    ) -> EndpointResolveTree {
        full_prefix.extend(current_prefix.iter().cloned());

        let query_params = self
            .query_params
            .iter()
            .filter_map(|(key, part)| {
                ResolveQueryParam::from_part(part, &taken, &untaken, false)
                    .map(|param| (key.clone(), param))
            })
            .collect();

        let leaf = EndpointResolveTree::Leaf(ResolveLeaf {
            endpoint: ResolveEndpoint {
                url_parts: full_prefix,
                query_params,
            },
            taken_keys: taken,
            untaken_keys: untaken,
        });
        EndpointResolveTree::with_prefix(current_prefix, leaf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::endpoint::EndpointParser;

    fn tree(template: &str) -> EndpointResolveTree {
        EndpointResolveTree::build(&EndpointParser::parse(template).unwrap())
    }

    fn request(target: &str) -> UrlRequest {
        UrlRequest::parse(target).unwrap()
    }

    fn bindings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_no_optionals_is_single_multiple() {
        let tree = tree("a/{b}/c");
        match &tree {
            EndpointResolveTree::Multiple { parts, next } => {
                assert_eq!(parts.len(), 3);
                assert!(matches!(**next, EndpointResolveTree::Leaf(_)));
            }
            other => panic!("Expected Multiple, got {:?}", other),
        }
        assert_eq!(tree.enumerate().len(), 1);
    }

    #[test]
    fn test_empty_endpoint_is_leaf() {
        let tree = tree("");
        assert!(matches!(tree, EndpointResolveTree::Leaf(_)));
        assert_eq!(tree.resolve(&request("")), Some(HashMap::new()));
        assert_eq!(tree.resolve(&request("x")), None);
    }

    #[test]
    fn test_prefix_before_branch_is_shared() {
        let tree = tree("a/{x}/[?o:{o}]");
        match &tree {
            EndpointResolveTree::Multiple { parts, next } => {
                assert_eq!(
                    parts,
                    &vec![
                        ResolveUrlPart::Static("a".to_string()),
                        ResolveUrlPart::Param("x".to_string())
                    ]
                );
                match &**next {
                    EndpointResolveTree::Fork(options) => assert_eq!(options.len(), 2),
                    other => panic!("Expected Fork, got {:?}", other),
                }
            }
            other => panic!("Expected Multiple, got {:?}", other),
        }
    }

    #[test]
    fn test_forks_never_nest_directly() {
        fn check(tree: &EndpointResolveTree) {
            match tree {
                EndpointResolveTree::Fork(options) => {
                    for option in options {
                        assert!(!matches!(option, EndpointResolveTree::Fork(_)));
                        check(option);
                    }
                }
                EndpointResolveTree::Multiple { next, .. } => check(next),
                EndpointResolveTree::Leaf(_) => {}
            }
        }

        let tree = tree("[?a:{a}]/[?b:{b}]/[?c:{c}]");
        check(&tree);
        assert_eq!(tree.enumerate().len(), 8);
    }

    #[test]
    fn test_taken_key_unwraps_later_parts() {
        let tree = tree("x/{{?n}}");
        let shapes = tree.shapes();
        assert_eq!(shapes.len(), 2);
        assert!(shapes.iter().any(|shape| shape.url_parts.len() == 1));
        assert!(shapes.iter().any(|shape| shape.url_parts.len() == 3));
    }

    #[test]
    fn test_nested_optionals_enumeration() {
        let tree = tree("[?a:[?b:{a}/{b}]]");
        let leaves = tree.enumerate();
        assert_eq!(leaves.len(), 3);
        for leaf in &leaves {
            assert!(
                !(leaf.taken_keys.contains("b") && !leaf.taken_keys.contains("a")),
                "b present without a: {:?}",
                leaf
            );
        }
        let full = leaves
            .iter()
            .find(|leaf| leaf.endpoint.url_parts.len() == 2)
            .unwrap();
        assert!(full.taken_keys.contains("a") && full.taken_keys.contains("b"));

        assert_eq!(tree.shapes().len(), 2);
    }

    #[test]
    fn test_query_params_follow_path_keys() {
        let tree = tree("a/[?k:{k}]?[?k:x={x}]&[?q:q={q}]&r={r}");
        for leaf in tree.enumerate() {
            let query = &leaf.endpoint.query_params;
            if leaf.taken_keys.contains("k") {
                assert_eq!(
                    query.get("x"),
                    Some(&ResolveQueryParam::Param {
                        name: "x".to_string(),
                        optional: false
                    })
                );
            } else {
                assert!(query.get("x").is_none());
            }
            assert_eq!(query.get("q").map(|p| p.is_optional()), Some(true));
            assert_eq!(query.get("r").map(|p| p.is_optional()), Some(false));
        }
    }

    #[test]
    fn test_resolve_positional() {
        let tree = tree("a/{b}/c/{d}");
        assert_eq!(
            tree.resolve(&request("a/1/c/2")),
            Some(bindings(&[("b", "1"), ("d", "2")]))
        );
        assert_eq!(tree.resolve(&request("a/1/x/2")), None);
        assert_eq!(tree.resolve(&request("a/1/c")), None);
        assert_eq!(tree.resolve(&request("a/1/c/2/3")), None);
    }

    #[test]
    fn test_resolve_optional_segments() {
        let tree = tree("a/{{n}}/{{?s}}");
        assert_eq!(
            tree.resolve(&request("a/n/1")),
            Some(bindings(&[("n", "1")]))
        );
        assert_eq!(
            tree.resolve(&request("a/n/1/s/2")),
            Some(bindings(&[("n", "1"), ("s", "2")]))
        );
        assert_eq!(tree.resolve(&request("a/n/1/t/2")), None);
    }

    #[test]
    fn test_resolve_query() {
        let tree = tree("a?mode=fast&v={v}&{{?page}}");
        assert_eq!(
            tree.resolve(&request("a?v=1&mode=fast")),
            Some(bindings(&[("v", "1")]))
        );
        assert_eq!(
            tree.resolve(&request("a?page=3&mode=fast&v=1&extra=x")),
            Some(bindings(&[("v", "1"), ("page", "3")]))
        );
        assert_eq!(tree.resolve(&request("a?v=1&mode=slow")), None);
        assert_eq!(tree.resolve(&request("a?mode=fast")), None);
    }

    #[test]
    fn test_repeated_parameter_must_agree() {
        let tree = tree("a/{x}/b/{x}?x={x}");
        assert_eq!(tree.resolve(&request("a/9/b/7?x=5")), None);
        assert_eq!(tree.resolve(&request("a/9/b/9?x=5")), None);
        assert_eq!(tree.resolve(&request("a/9/b/9?x=9")), Some(bindings(&[("x", "9")])));

        for shape in tree.shapes() {
            assert_eq!(shape.resolve(&request("a/9/b/7?x=7")), None);
            assert_eq!(shape.resolve(&request("a/9/b/9?x=9")), Some(bindings(&[("x", "9")])));
        }
    }

    #[test]
    fn test_repeated_parameter_across_branch() {
        // x is bound before the fork and again inside the taken branch
        let tree = tree("{x}/[?o:o/{x}]");
        assert_eq!(tree.resolve(&request("1/o/1")), Some(bindings(&[("x", "1")])));
        assert_eq!(tree.resolve(&request("1/o/2")), None);
        assert_eq!(tree.resolve(&request("1")), Some(bindings(&[("x", "1")])));
    }

    #[test]
    fn test_conflict_in_one_branch_falls_through_to_the_next() {
        // The taken branch binds y twice; the untaken branch binds it once
        let tree = tree("{y}/[?o:{y}]/[?p:{z}]");
        assert_eq!(
            tree.resolve(&request("1/2")),
            Some(bindings(&[("y", "1"), ("z", "2")]))
        );
        assert_eq!(tree.resolve(&request("1/1")), Some(bindings(&[("y", "1")])));
    }

    #[test]
    fn test_first_fork_child_wins() {
        // Both shapes match a single segment; the taken branch is declared first
        let tree = tree("[?a:{a}]/[?b:{b}]");
        assert_eq!(tree.resolve(&request("1")), Some(bindings(&[("a", "1")])));
    }

    #[test]
    fn test_resolve_endpoint_directly() {
        let tree = tree("krosstalk/{{?n}}");
        let shapes = tree.shapes();
        let without = shapes.iter().find(|s| s.url_parts.len() == 1).unwrap();
        let with = shapes.iter().find(|s| s.url_parts.len() == 3).unwrap();

        assert_eq!(without.resolve(&request("krosstalk")), Some(HashMap::new()));
        assert_eq!(without.resolve(&request("krosstalk/n/5")), None);
        assert_eq!(with.resolve(&request("krosstalk/n/5")), Some(bindings(&[("n", "5")])));
    }

    #[test]
    fn test_shape_display() {
        let tree = tree("items/{id}?q={q}&{{?page}}&v=2");
        let shapes: Vec<String> = tree.shapes().iter().map(|s| s.to_string()).collect();
        assert_eq!(shapes, vec!["items/{id}?[page={page}]&q={q}&v=2"]);
    }

    #[test]
    fn test_build_is_deterministic() {
        let template = "p/[?a:{a}]/m/[?b:x/[?c:{c}]]?[?a:q={q}]";
        assert_eq!(tree(template).enumerate(), tree(template).enumerate());
        assert_eq!(tree(template), tree(template));
    }
}
