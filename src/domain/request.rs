// Incoming request targets, decomposed for matching

use std::collections::BTreeMap;
use std::fmt;

use url::Url;

use crate::error::RequestError;

/// A literal request target split into path segments and query values.
///
/// Values are kept exactly as received; no percent-decoding happens here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlRequest {
    pub url_parts: Vec<String>,
    pub query_params: BTreeMap<String, String>,
}

impl UrlRequest {
    pub fn new(url_parts: Vec<String>, query_params: BTreeMap<String, String>) -> Self {
        Self {
            url_parts: url_parts.into_iter().filter(|s| !s.is_empty()).collect(),
            query_params,
        }
    }

    /// Decompose a raw target such as `/a/b?x=1` or `https://host/a/b?x=1#frag`.
    ///
    /// Scheme and authority are stripped from absolute targets. The remaining path and
    /// query text is used exactly as written in both cases.
    pub fn parse(target: &str) -> Result<Self, RequestError> {
        let relative = match scheme_len(target) {
            Some(len) => {
                Url::parse(target).map_err(|e| RequestError::InvalidTarget {
                    target: target.to_string(),
                    reason: e.to_string(),
                })?;
                let after_scheme = &target[len + 3..];
                let authority_end = after_scheme
                    .find(|c: char| matches!(c, '/' | '?' | '#'))
                    .unwrap_or(after_scheme.len());
                &after_scheme[authority_end..]
            }
            None => target,
        };

        let without_fragment = relative.split_once('#').map_or(relative, |(before, _)| before);
        let (path, query) = match without_fragment.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (without_fragment, None),
        };

        let url_parts = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();

        let mut query_params = BTreeMap::new();
        for entry in query.unwrap_or("").split('&') {
            if entry.is_empty() {
                continue;
            }
            let (key, value) = entry.split_once('=').ok_or_else(|| {
                tracing::warn!(request_target = %target, entry = %entry, "Malformed query entry");
                RequestError::MalformedQuery {
                    entry: entry.to_string(),
                }
            })?;
            query_params.insert(key.to_string(), value.to_string());
        }

        Ok(Self {
            url_parts,
            query_params,
        })
    }

    /// The request with the leading `prefix` segments removed, if it starts with them
    pub fn without_prefix(&self, prefix: &str) -> Option<UrlRequest> {
        let prefix: Vec<&str> = prefix.split('/').filter(|s| !s.is_empty()).collect();
        if self.url_parts.len() < prefix.len()
            || self.url_parts.iter().zip(&prefix).any(|(part, p)| part.as_str() != *p)
        {
            return None;
        }
        Some(Self {
            url_parts: self.url_parts[prefix.len()..].to_vec(),
            query_params: self.query_params.clone(),
        })
    }
}

/// Length of a leading `scheme` in `scheme://...`, if the target has one
fn scheme_len(target: &str) -> Option<usize> {
    let len = target.find("://")?;
    let scheme = &target[..len];
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(len)
}

impl fmt::Display for UrlRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url_parts.join("/"))?;
        for (i, (key, value)) in self.query_params.iter().enumerate() {
            write!(f, "{}{}={}", if i == 0 { "?" } else { "&" }, key, value)?;
        }
        Ok(())
    }
}
