//! Resolution of the addresses a route's hostnames should point at.

use std::sync::Arc;

use k8s_openapi::api::core::v1::Service;
use tracing::debug;

use crate::{annotations::Annotations, error::Error, route::RouteObject, snapshot::IndexedSnapshot};

mod load_balancer;
mod reference;

pub use load_balancer::{ingress_targets, service_targets};
pub use reference::{ReferenceError, ServiceReference};

/// Finds the targets of a route, in order of precedence:
/// the target annotation, the load balancer status on the route itself, then a load balancer
/// service, either the one configured for the whole source or the one the route references.
pub struct TargetResolver {
    services: Arc<dyn IndexedSnapshot<Service>>,
    static_service: Option<ServiceReference>,
    default_namespace: String,
}

impl TargetResolver {
    pub fn new(
        services: Arc<dyn IndexedSnapshot<Service>>,
        static_service: Option<ServiceReference>,
        default_namespace: String,
    ) -> TargetResolver {
        TargetResolver {
            services,
            static_service,
            default_namespace,
        }
    }

    /// A malformed reference fails the pass, a missing service is reported as [`Error::Lookup`].
    pub fn resolve<R: RouteObject>(
        &self,
        route: &R,
        annotations: &Annotations,
    ) -> Result<Vec<String>, Error> {
        let overridden = crate::annotations::targets(annotations);
        if !overridden.is_empty() {
            debug!(
                msg = "using targets from annotation",
                resource = route.resource_id(),
                targets = ?overridden
            );
            return Ok(overridden);
        }

        let embedded = ingress_targets(route.load_balancer());
        if !embedded.is_empty() {
            return Ok(embedded);
        }

        let reference = match (&self.static_service, route.service_reference()) {
            (Some(static_service), _) => static_service.clone(),
            (None, Some(reference)) => {
                ServiceReference::parse(&reference, &self.default_namespace)?
            }
            (None, None) => return Ok(vec![]),
        };
        self.targets_from_service(&reference)
    }

    fn targets_from_service(&self, reference: &ServiceReference) -> Result<Vec<String>, Error> {
        let svc = self
            .services
            .get(&reference.namespace, &reference.name)
            .ok_or_else(|| Error::Lookup {
                kind: "Service",
                namespace: reference.namespace.clone(),
                name: reference.name.clone(),
            })?;
        Ok(service_targets(&svc))
    }
}
