// Domain model: endpoint templates and incoming requests

pub mod endpoint;
pub mod request;
