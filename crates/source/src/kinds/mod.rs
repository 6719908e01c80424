//! The routing resource kinds records can be generated from. Only the fields needed to read
//! hostnames, status and load balancer addresses are typed, everything else is kept in [`Fields`]
//! so FQDN templates see the whole object.

use std::collections::BTreeMap;

pub mod ambassador;
pub mod contour;
pub mod gloo;
pub mod kong;

pub use ambassador::Host;
pub use contour::{HTTPProxy, IngressRoute};
pub use gloo::{GlooVirtualHost, GlooVirtualHosts, Proxy, VirtualService};
pub use kong::TCPIngress;

/// Fields of a resource that are not typed here
pub type Fields = BTreeMap<String, serde_json::Value>;
