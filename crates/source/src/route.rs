use std::{borrow::Cow, fmt::Debug};

use k8s_openapi::api::core::v1::LoadBalancerIngress;
use kube::api::ObjectMeta;
use serde::Serialize;

use crate::{annotations::Annotations, source::SourceConfig};

/// What the endpoint pipeline needs to know about one routing object.
///
/// Each supported resource kind implements this once; everything else is shared.
pub trait RouteObject: Serialize + Debug + Send + Sync + 'static {
    /// Kind name used in the `resource` label
    const KIND: &'static str;

    /// Objects missing this annotation are not handled at all
    const REQUIRED_ANNOTATION: Option<&'static str> = None;

    fn object_meta(&self) -> &ObjectMeta;

    /// Annotations that drive record generation, the object's own unless the kind borrows them
    /// from elsewhere
    fn route_annotations(&self) -> Cow<'_, Annotations> {
        self.object_meta()
            .annotations
            .as_ref()
            .map(Cow::Borrowed)
            .unwrap_or_default()
    }

    /// Hostnames declared in the object's own spec, in declaration order
    fn spec_hostnames(&self) -> Vec<String>;

    /// Objects the routing controller rejected are skipped
    fn is_valid(&self) -> bool {
        true
    }

    /// Load balancer addresses recorded on the object itself
    fn load_balancer(&self) -> &[LoadBalancerIngress] {
        &[]
    }

    /// Reference to a load balancer service, `namespace/name` or `name.namespace`
    fn service_reference(&self) -> Option<Cow<'_, str>> {
        None
    }

    /// Load balancer service shared by every object of this kind, preferred over per-object
    /// references
    fn static_service(_config: &SourceConfig) -> Option<&str> {
        None
    }

    /// `<kind>/<namespace>/<name>`
    fn resource_id(&self) -> String {
        let meta = self.object_meta();
        format!(
            "{}/{}/{}",
            Self::KIND,
            meta.namespace.as_deref().unwrap_or_default(),
            meta.name.as_deref().unwrap_or_default()
        )
    }
}
