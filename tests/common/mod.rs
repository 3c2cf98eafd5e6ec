// Common test utilities shared across test files

use std::collections::{HashMap, HashSet};

use krosstalk_endpoint::{Endpoint, EndpointParser, UrlRequest};

/// Parse a template, panicking on malformed input
#[allow(dead_code)]
pub fn endpoint(template: &str) -> Endpoint {
    EndpointParser::parse(template).expect("template should parse")
}

/// Decompose a request target, panicking on malformed input
#[allow(dead_code)]
pub fn request(target: &str) -> UrlRequest {
    UrlRequest::parse(target).expect("request should parse")
}

#[allow(dead_code)]
pub fn keys(names: &[&str]) -> HashSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[allow(dead_code)]
pub fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[allow(dead_code)]
pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
