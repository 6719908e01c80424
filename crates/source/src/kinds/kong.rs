use k8s_openapi::api::core::v1::{LoadBalancerIngress, LoadBalancerStatus};
use kube::{CustomResource, api::ObjectMeta};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Fields;
use crate::route::RouteObject;

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[kube(
    group = "configuration.konghq.com",
    version = "v1beta1",
    kind = "TCPIngress",
    plural = "tcpingresses",
    namespaced,
    status = "TcpIngressStatus",
    doc = "Kong TCP ingress"
)]
#[serde(rename_all = "camelCase")]
pub struct TcpIngressSpec {
    #[serde(default)]
    pub rules: Vec<TcpIngressRule>,
    #[serde(flatten)]
    pub extra: Fields,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TcpIngressRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default)]
    pub port: i32,
    #[serde(flatten)]
    pub extra: Fields,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TcpIngressStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_balancer: Option<LoadBalancerStatus>,
    #[serde(flatten)]
    pub extra: Fields,
}

impl RouteObject for TCPIngress {
    const KIND: &'static str = "tcpingress";

    fn object_meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn spec_hostnames(&self) -> Vec<String> {
        self.spec
            .rules
            .iter()
            .filter_map(|rule| rule.host.clone())
            .collect()
    }

    fn load_balancer(&self) -> &[LoadBalancerIngress] {
        self.status
            .as_ref()
            .and_then(|s| s.load_balancer.as_ref())
            .and_then(|lb| lb.ingress.as_deref())
            .unwrap_or_default()
    }
}
