//! Gloo proxies. Every virtual host of a proxy is published on its own, with the annotations of
//! the virtual services it was generated from.

use std::{borrow::Cow, sync::Arc};

use kube::{CustomResource, api::ObjectMeta};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::Fields;
use crate::{
    annotations::Annotations,
    route::RouteObject,
    snapshot::{IndexedSnapshot, Snapshot},
};

/// Source kind Gloo records for virtual hosts generated from a virtual service
const VIRTUAL_SERVICE_SOURCE_KIND: &str = "*v1.VirtualService";

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[kube(
    group = "gloo.solo.io",
    version = "v1",
    kind = "Proxy",
    plural = "proxies",
    namespaced,
    doc = "Gloo proxy"
)]
#[serde(rename_all = "camelCase")]
pub struct ProxySpec {
    #[serde(default, rename = "listener")]
    pub listeners: Vec<Listener>,
    #[serde(flatten)]
    pub extra: Fields,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Listener {
    #[serde(default)]
    pub http_listener: HttpListener,
    #[serde(flatten)]
    pub extra: Fields,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HttpListener {
    #[serde(default)]
    pub virtual_hosts: Vec<VirtualHost>,
    #[serde(flatten)]
    pub extra: Fields,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VirtualHost {
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub metadata: VirtualHostMetadata,
    #[serde(flatten)]
    pub extra: Fields,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VirtualHostMetadata {
    #[serde(default)]
    pub source: Vec<VirtualHostSource>,
    #[serde(flatten)]
    pub extra: Fields,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VirtualHostSource {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
}

/// Only the metadata of virtual services is read
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[kube(
    group = "gateway.solo.io",
    version = "v1",
    kind = "VirtualService",
    plural = "virtualservices",
    namespaced,
    doc = "Gloo gateway virtual service"
)]
pub struct VirtualServiceSpec {}

/// One virtual host of a proxy.
///
/// Serializes as the proxy's metadata with the virtual host as `spec`, which is what FQDN
/// templates see.
#[derive(Debug, Clone, Serialize)]
pub struct GlooVirtualHost {
    pub metadata: ObjectMeta,
    pub spec: VirtualHost,
    #[serde(skip)]
    annotations: Annotations,
    #[serde(skip)]
    proxy_service: String,
}

impl RouteObject for GlooVirtualHost {
    const KIND: &'static str = "proxy";

    fn object_meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn route_annotations(&self) -> Cow<'_, Annotations> {
        Cow::Borrowed(&self.annotations)
    }

    fn spec_hostnames(&self) -> Vec<String> {
        self.spec.domains.clone()
    }

    /// The load balancer service is named after the proxy and lives next to it
    fn service_reference(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(&self.proxy_service))
    }
}

/// Flattens proxies into their virtual hosts
pub struct GlooVirtualHosts {
    proxies: Arc<dyn Snapshot<Proxy>>,
    virtual_services: Arc<dyn IndexedSnapshot<VirtualService>>,
}

impl GlooVirtualHosts {
    pub fn new(
        proxies: Arc<dyn Snapshot<Proxy>>,
        virtual_services: Arc<dyn IndexedSnapshot<VirtualService>>,
    ) -> GlooVirtualHosts {
        GlooVirtualHosts {
            proxies,
            virtual_services,
        }
    }

    fn virtual_hosts(&self, proxy: &Proxy) -> Vec<GlooVirtualHost> {
        let proxy_service = format!(
            "{}/{}",
            proxy.metadata.namespace.as_deref().unwrap_or_default(),
            proxy.metadata.name.as_deref().unwrap_or_default()
        );
        proxy
            .spec
            .listeners
            .iter()
            .flat_map(|listener| &listener.http_listener.virtual_hosts)
            .map(|vhost| GlooVirtualHost {
                metadata: proxy.metadata.clone(),
                spec: vhost.clone(),
                annotations: self.annotations(vhost),
                proxy_service: proxy_service.clone(),
            })
            .collect()
    }

    /// Merges the annotations of the virtual services a virtual host was built from, later ones
    /// override earlier ones
    fn annotations(&self, vhost: &VirtualHost) -> Annotations {
        let mut annotations = Annotations::new();
        for src in vhost
            .metadata
            .source
            .iter()
            .filter(|src| src.kind == VIRTUAL_SERVICE_SOURCE_KIND)
        {
            let Some(vs) = self.virtual_services.get(&src.namespace, &src.name) else {
                warn!(
                    msg = "virtual service not found, its annotations are ignored",
                    namespace = src.namespace,
                    name = src.name
                );
                continue;
            };
            if let Some(vs_annotations) = &vs.metadata.annotations {
                annotations.extend(vs_annotations.clone());
            }
        }
        annotations
    }
}

impl Snapshot<GlooVirtualHost> for GlooVirtualHosts {
    fn list(&self, namespace: Option<&str>) -> Vec<Arc<GlooVirtualHost>> {
        self.proxies
            .list(namespace)
            .iter()
            .flat_map(|proxy| self.virtual_hosts(proxy))
            .map(Arc::new)
            .collect()
    }
}
