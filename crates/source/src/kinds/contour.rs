//! Contour routing objects: `HTTPProxy` and the older `IngressRoute`.

use k8s_openapi::api::core::v1::{LoadBalancerIngress, LoadBalancerStatus};
use kube::{CustomResource, api::ObjectMeta};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Fields;
use crate::{route::RouteObject, source::SourceConfig};

/// Contour marks objects it accepted with this status
const VALID_STATUS: &str = "valid";

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[kube(
    group = "projectcontour.io",
    version = "v1",
    kind = "HTTPProxy",
    plural = "httpproxies",
    namespaced,
    status = "HttpProxyStatus",
    doc = "Contour HTTP proxy, the fields needed to publish its virtual host"
)]
#[serde(rename_all = "camelCase")]
pub struct HttpProxySpec {
    /// Root proxies have a virtual host, delegated ones do not
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtualhost: Option<VirtualHost>,
    #[serde(flatten)]
    pub extra: Fields,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VirtualHost {
    #[serde(default)]
    pub fqdn: String,
    #[serde(flatten)]
    pub extra: Fields,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HttpProxyStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_balancer: Option<LoadBalancerStatus>,
    #[serde(flatten)]
    pub extra: Fields,
}

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[kube(
    group = "contour.heptio.com",
    version = "v1beta1",
    kind = "IngressRoute",
    plural = "ingressroutes",
    namespaced,
    status = "IngressRouteStatus",
    doc = "Contour IngressRoute, superseded by HTTPProxy"
)]
#[serde(rename_all = "camelCase")]
pub struct IngressRouteSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtualhost: Option<VirtualHost>,
    #[serde(flatten)]
    pub extra: Fields,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngressRouteStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Fields,
}

fn fqdn(virtualhost: Option<&VirtualHost>) -> Vec<String> {
    virtualhost.map(|vh| vec![vh.fqdn.clone()]).unwrap_or_default()
}

impl RouteObject for HTTPProxy {
    const KIND: &'static str = "HTTPProxy";

    fn object_meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn spec_hostnames(&self) -> Vec<String> {
        fqdn(self.spec.virtualhost.as_ref())
    }

    fn is_valid(&self) -> bool {
        self.status
            .as_ref()
            .and_then(|s| s.current_status.as_deref())
            == Some(VALID_STATUS)
    }

    fn load_balancer(&self) -> &[LoadBalancerIngress] {
        self.status
            .as_ref()
            .and_then(|s| s.load_balancer.as_ref())
            .and_then(|lb| lb.ingress.as_deref())
            .unwrap_or_default()
    }
}

/// IngressRoutes carry no load balancer status, their targets come from the statically
/// configured Contour service
impl RouteObject for IngressRoute {
    const KIND: &'static str = "ingressroute";

    fn object_meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn spec_hostnames(&self) -> Vec<String> {
        fqdn(self.spec.virtualhost.as_ref())
    }

    fn is_valid(&self) -> bool {
        self.status
            .as_ref()
            .and_then(|s| s.current_status.as_deref())
            == Some(VALID_STATUS)
    }

    fn static_service(config: &SourceConfig) -> Option<&str> {
        Some(config.contour_load_balancer.as_str()).filter(|s| !s.trim().is_empty())
    }
}
