// Endpoint template engine
//
// Templates are parsed once per method into an `Endpoint`. Outbound calls render it
// with `fill`; inbound calls compile it into an `EndpointResolveTree` and match
// request targets against that.

mod ast;
mod filler;
mod parser;
pub mod preprocess;
mod resolve_tree;

pub use ast::{
    Endpoint, EndpointPart, DEFAULT_ENDPOINT, EXTENSION_RECEIVER, INSTANCE_RECEIVER,
    METHOD_NAME, PREFIX, RESERVED_PARAMETERS,
};
pub use parser::EndpointParser;
pub use resolve_tree::{
    EndpointResolveTree, ResolveEndpoint, ResolveLeaf, ResolveQueryParam, ResolveUrlPart,
};
