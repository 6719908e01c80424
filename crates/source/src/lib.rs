//! Generates DNS endpoints from the routing resources of several ingress controllers.

pub mod annotations;
pub mod endpoint;
mod error;
pub mod filter;
pub mod hostnames;
pub mod kinds;
pub mod registry;
pub mod route;
pub mod selector;
pub mod snapshot;
pub mod source;
pub mod targets;
pub mod template;

pub use endpoint::Endpoint;
pub use error::Error;
pub use registry::{SourceKind, SourceRegistry, SourcesOutput};
pub use route::RouteObject;
pub use source::{RouteSource, Source, SourceConfig};
