// Endpoint template parser using bracket-depth scanning

use once_cell::sync::Lazy;
use regex::Regex;

use super::ast::{Endpoint, EndpointPart, RESERVED_PARAMETERS};
use super::preprocess;
use crate::error::EndpointError;

static PARAMETER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\{([^{}/\[\]?&=]+)\}$").expect("valid parameter pattern"));

pub struct EndpointParser<'a> {
    template: &'a str,
}

impl<'a> EndpointParser<'a> {
    /// Parse a raw template, expanding shorthand macros in each region first
    pub fn parse(template: &'a str) -> Result<Endpoint, EndpointError> {
        let parser = Self { template };

        let (path, query) = split_query(template);
        let url_parts = parser.parse_url_parts(&preprocess::expand(path, false))?;
        let query_params = match query {
            Some(query) => parser.parse_query(&preprocess::expand(query, true))?,
            None => Vec::new(),
        };

        for (i, (key, _)) in query_params.iter().enumerate() {
            if query_params[..i].iter().any(|(other, _)| other == key) {
                return Err(EndpointError::DuplicateQueryParameter { key: key.clone() });
            }
        }

        Ok(Endpoint::new(url_parts, query_params))
    }

    fn parse_url_parts(&self, region: &str) -> Result<Vec<EndpointPart>, EndpointError> {
        let mut parts = Vec::new();
        let mut rest = region.trim_matches('/');

        while !rest.is_empty() {
            if rest.starts_with("[?") {
                let (key, body, after) = self.split_optional(rest, '/')?;
                for part in self.parse_url_parts(body)? {
                    parts.push(EndpointPart::optional(key, part));
                }
                rest = after;
            } else {
                let end = rest.find('/').unwrap_or(rest.len());
                parts.push(self.parse_chunk(&rest[..end])?);
                rest = &rest[end..];
            }
            rest = rest.trim_start_matches('/');
        }

        Ok(parts)
    }

    fn parse_query(&self, region: &str) -> Result<Vec<(String, EndpointPart)>, EndpointError> {
        let mut params = Vec::new();
        let mut rest = region.trim_matches('&');

        while !rest.is_empty() {
            if rest.starts_with("[?") {
                let (key, body, after) = self.split_optional(rest, '&')?;
                for (name, part) in self.parse_query(body)? {
                    params.push((name, EndpointPart::optional(key, part)));
                }
                rest = after;
            } else {
                let end = rest.find('&').unwrap_or(rest.len());
                let entry = &rest[..end];
                let (name, value) = entry
                    .split_once('=')
                    .filter(|(name, _)| !name.is_empty())
                    .ok_or_else(|| EndpointError::MalformedQueryEntry {
                        entry: entry.to_string(),
                    })?;
                params.push((name.to_string(), self.parse_chunk(value)?));
                rest = &rest[end..];
            }
            rest = rest.trim_start_matches('&');
        }

        Ok(params)
    }

    /// Split `[?key:body]rest` into its pieces.
    ///
    /// The block must be followed by `separator` or the end of the region.
    fn split_optional<'s>(
        &self,
        input: &'s str,
        separator: char,
    ) -> Result<(&'s str, &'s str, &'s str), EndpointError> {
        let close = matching_bracket(input).ok_or_else(|| EndpointError::UnbalancedOptional {
            template: self.template.to_string(),
        })?;
        let block = &input[..=close];
        let malformed = || EndpointError::MalformedOptional {
            block: block.to_string(),
        };

        let (key, body) = input[2..close].split_once(':').ok_or_else(malformed)?;
        if key.is_empty() {
            return Err(malformed());
        }

        let after = &input[close + 1..];
        if !after.is_empty() && !after.starts_with(separator) {
            return Err(malformed());
        }

        Ok((key, body, after))
    }

    fn parse_chunk(&self, chunk: &str) -> Result<EndpointPart, EndpointError> {
        if chunk.contains("[?") {
            return Err(EndpointError::MalformedOptional {
                block: chunk.to_string(),
            });
        }
        if chunk.contains('[') || chunk.contains(']') {
            return Err(EndpointError::UnbalancedOptional {
                template: self.template.to_string(),
            });
        }

        if let Some(caps) = PARAMETER.captures(chunk) {
            return Ok(EndpointPart::Parameter(caps[1].to_string()));
        }
        if RESERVED_PARAMETERS.contains(&chunk) {
            return Ok(EndpointPart::Parameter(chunk.to_string()));
        }
        Ok(EndpointPart::Static(chunk.to_string()))
    }
}

/// Split on the first `?` that is not inside `{...}` or `[...]`
fn split_query(template: &str) -> (&str, Option<&str>) {
    let mut depth = 0usize;
    for (i, ch) in template.char_indices() {
        match ch {
            '{' | '[' => depth += 1,
            '}' | ']' => depth = depth.saturating_sub(1),
            '?' if depth == 0 => return (&template[..i], Some(&template[i + 1..])),
            _ => {}
        }
    }
    (template, None)
}

/// Index of the `]` closing the `[` at the start of `input`
fn matching_bracket(input: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, ch) in input.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
