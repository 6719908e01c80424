use std::borrow::Cow;

use kube::{CustomResource, api::ObjectMeta};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Fields;
use crate::{annotations::AMBASSADOR_SERVICE_ANNOTATION, route::RouteObject};

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[kube(
    group = "getambassador.io",
    version = "v2",
    kind = "Host",
    plural = "hosts",
    namespaced,
    doc = "Ambassador Host"
)]
#[serde(rename_all = "camelCase")]
pub struct HostSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(flatten)]
    pub extra: Fields,
}

/// Hosts do not know their load balancer, it is named by an annotation that has to be present
impl RouteObject for Host {
    const KIND: &'static str = "host";
    const REQUIRED_ANNOTATION: Option<&'static str> = Some(AMBASSADOR_SERVICE_ANNOTATION);

    fn object_meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn spec_hostnames(&self) -> Vec<String> {
        self.spec.hostname.iter().cloned().collect()
    }

    fn service_reference(&self) -> Option<Cow<'_, str>> {
        self.metadata
            .annotations
            .as_ref()?
            .get(AMBASSADOR_SERVICE_ANNOTATION)
            .map(|s| Cow::Borrowed(s.as_str()))
    }
}
