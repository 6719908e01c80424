use itertools::Itertools;
use k8s_openapi::api::core::v1::{LoadBalancerIngress, Service};
use tracing::warn;

const SERVICE_TYPE_LOAD_BALANCER: &str = "LoadBalancer";

/// Addresses of load balancer ingress points, the IP before the hostname of each entry
pub fn ingress_targets(ingress: &[LoadBalancerIngress]) -> Vec<String> {
    ingress
        .iter()
        .flat_map(|lb| [lb.ip.as_deref(), lb.hostname.as_deref()])
        .flatten()
        .filter(|addr| !addr.is_empty())
        .map(str::to_string)
        .collect_vec()
}

/// Load balancer addresses of a service.
///
/// Services of any explicit type other than `LoadBalancer` have none.
pub fn service_targets(svc: &Service) -> Vec<String> {
    if let Some(type_) = svc.spec.as_ref().and_then(|spec| spec.type_.as_deref())
        && type_ != SERVICE_TYPE_LOAD_BALANCER
    {
        warn!(
            msg = "referenced service is not a load balancer, ignoring",
            svc = svc.metadata.name,
            namespace = svc.metadata.namespace,
            service_type = type_
        );
        return vec![];
    }
    svc.status
        .as_ref()
        .and_then(|status| status.load_balancer.as_ref())
        .and_then(|lb| lb.ingress.as_deref())
        .map(ingress_targets)
        .unwrap_or_default()
}
