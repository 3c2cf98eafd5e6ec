// Error types for the endpoint engine

use thiserror::Error;

/// Errors raised while registering or filling an endpoint.
///
/// These point at a declaration bug and are expected to abort startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    /// An optional block was opened but never closed, or closed without being opened.
    #[error("Unbalanced optional block in template '{template}'")]
    UnbalancedOptional { template: String },

    /// An optional block has no `key:` or does not cover whole segments.
    #[error("Malformed optional block '{block}'")]
    MalformedOptional { block: String },

    /// A query entry in the template lacks `=`.
    #[error("Malformed query entry '{entry}': expected 'key=value'")]
    MalformedQueryEntry { entry: String },

    #[error("Duplicate query parameter '{key}'")]
    DuplicateQueryParameter { key: String },

    /// The template references a parameter the method does not declare.
    #[error("Unknown endpoint parameter '{name}' for method '{method}'")]
    UnknownParameter { method: String, name: String },

    /// A parameter had no value at fill time.
    #[error("Missing value for endpoint parameter '{name}'")]
    MissingArgument { name: String },

    #[error("Method '{name}' is already registered")]
    DuplicateMethod { name: String },
}

/// Errors raised while decomposing a single incoming request.
///
/// These fail one request only; a request that simply does not match is not an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Malformed query entry '{entry}': expected 'key=value'")]
    MalformedQuery { entry: String },

    #[error("Invalid request target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },
}
