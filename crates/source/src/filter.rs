use tracing::debug;

use crate::{
    annotations::{Annotations, CONTROLLER_ANNOTATION},
    route::RouteObject,
    selector::AnnotationSelector,
};

/// Decides whether a route is handled by this source at all
#[derive(Debug, Clone)]
pub struct ResourceFilter {
    selector: AnnotationSelector,
    controller: String,
}

impl ResourceFilter {
    pub fn new(selector: AnnotationSelector, controller: String) -> ResourceFilter {
        ResourceFilter {
            selector,
            controller,
        }
    }

    pub fn keep<R: RouteObject>(&self, route: &R, annotations: &Annotations) -> bool {
        if !self.selector.matches(annotations) {
            debug!(
                msg = "skipping resource, annotations do not match filter",
                resource = route.resource_id(),
                filter = %self.selector
            );
            return false;
        }
        if let Some(controller) = annotations.get(CONTROLLER_ANNOTATION)
            && *controller != self.controller
        {
            debug!(
                msg = "skipping resource, controller value does not match",
                resource = route.resource_id(),
                found = controller,
                required = self.controller
            );
            return false;
        }
        if let Some(required) = R::REQUIRED_ANNOTATION
            && !annotations.contains_key(required)
        {
            debug!(
                msg = "skipping resource, required annotation missing",
                resource = route.resource_id(),
                annotation = required
            );
            return false;
        }
        if !route.is_valid() {
            debug!(
                msg = "skipping resource, it is not valid",
                resource = route.resource_id()
            );
            return false;
        }
        true
    }
}
