use std::{
    fmt::{Debug, Display},
    hash::Hash,
    str::FromStr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use futures::{StreamExt, future};
use k8s_openapi::{NamespaceResourceScope, api::core::v1::Service};
use kube::{
    Api, Client, Resource,
    runtime::{
        WatchStreamExt,
        reflector::{self, Store},
        watcher,
    },
};
use serde::de::DeserializeOwned;
use tracing::{error, info, instrument, warn};

use crate::{
    endpoint::Endpoint,
    error::Error,
    kinds::{HTTPProxy, Host, IngressRoute, Proxy, TCPIngress, VirtualService},
    route::RouteObject,
    source::{RouteSource, Source, SourceConfig},
};

/// The routing products endpoints can be generated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    ContourHttpProxy,
    ContourIngressRoute,
    AmbassadorHost,
    GlooProxy,
    KongTcpIngress,
}

impl SourceKind {
    pub const ALL: [SourceKind; 5] = [
        SourceKind::ContourHttpProxy,
        SourceKind::ContourIngressRoute,
        SourceKind::AmbassadorHost,
        SourceKind::GlooProxy,
        SourceKind::KongTcpIngress,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::ContourHttpProxy => "contour-httpproxy",
            SourceKind::ContourIngressRoute => "contour-ingressroute",
            SourceKind::AmbassadorHost => "ambassador-host",
            SourceKind::GlooProxy => "gloo-proxy",
            SourceKind::KongTcpIngress => "kong-tcpingress",
        }
    }
}

impl Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for SourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "unknown source `{s}`, expected one of {}",
                    SourceKind::ALL.map(|kind| kind.name()).join(", ")
                ))
            })
    }
}

/// Result of running every registered source once
#[derive(Debug, Default)]
pub struct SourcesOutput {
    pub endpoints: Vec<Endpoint>,
    /// Failures of individual sources, the other sources' endpoints are still complete
    pub errors: Vec<(&'static str, Error)>,
}

pub struct SourceRegistry {
    sources: Vec<Box<dyn Source>>,
}

impl SourceRegistry {
    pub fn new(sources: Vec<Box<dyn Source>>) -> SourceRegistry {
        SourceRegistry { sources }
    }

    /// Like [`SourceRegistry::from_client`] with the client of the current kube context
    pub async fn try_default(
        config: &SourceConfig,
        kinds: &[SourceKind],
    ) -> Result<SourceRegistry, Error> {
        SourceRegistry::from_client(Client::try_default().await?, config, kinds).await
    }

    /// Starts a reflector for every resource the given kinds read and waits for the initial
    /// listings before building the sources
    pub async fn from_client(
        client: Client,
        config: &SourceConfig,
        kinds: &[SourceKind],
    ) -> Result<SourceRegistry, Error> {
        let services: Arc<Store<Service>> = Arc::new(reflect(Api::all(client.clone())).await?);
        let mut sources: Vec<Box<dyn Source>> = vec![];
        for kind in kinds {
            info!(msg = "starting source", source = %kind);
            let source: Box<dyn Source> = match kind {
                SourceKind::ContourHttpProxy => {
                    route_source::<HTTPProxy>(&client, config, services.clone()).await?
                }
                SourceKind::ContourIngressRoute => {
                    route_source::<IngressRoute>(&client, config, services.clone()).await?
                }
                SourceKind::AmbassadorHost => {
                    route_source::<Host>(&client, config, services.clone()).await?
                }
                SourceKind::KongTcpIngress => {
                    route_source::<TCPIngress>(&client, config, services.clone()).await?
                }
                SourceKind::GlooProxy => {
                    let proxies: Store<Proxy> =
                        reflect(Api::namespaced(client.clone(), &config.gloo_namespace)).await?;
                    let virtual_services: Store<VirtualService> =
                        reflect(Api::all(client.clone())).await?;
                    Box::new(RouteSource::gloo(
                        config,
                        Arc::new(proxies),
                        Arc::new(virtual_services),
                        services.clone(),
                    )?)
                }
            };
            sources.push(source);
        }
        Ok(SourceRegistry::new(sources))
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.sources.iter().map(|source| source.kind()).collect()
    }

    /// Runs every source in order.
    ///
    /// A failing source adds its error and no endpoints. Cancellation aborts the whole run, no
    /// partial output is returned.
    #[instrument(skip_all)]
    pub fn endpoints(&self, cancel: &AtomicBool) -> Result<SourcesOutput, Error> {
        let mut output = SourcesOutput::default();
        for source in &self.sources {
            if cancel.load(Ordering::Relaxed) {
                return Err(Error::Cancelled);
            }
            match source.endpoints(cancel) {
                Ok(endpoints) => output.endpoints.extend(endpoints),
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => {
                    error!(msg = "source failed", source = source.kind(), err = %e);
                    output.errors.push((source.kind(), e));
                }
            }
        }
        Ok(output)
    }
}

async fn route_source<R>(
    client: &Client,
    config: &SourceConfig,
    services: Arc<Store<Service>>,
) -> Result<Box<dyn Source>, Error>
where
    R: RouteObject + Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned,
    R::DynamicType: Default + Eq + Hash + Clone + Send + Sync,
{
    let api: Api<R> = match &config.namespace {
        Some(namespace) => Api::namespaced(client.clone(), namespace),
        None => Api::all(client.clone()),
    };
    let routes = reflect(api).await?;
    Ok(Box::new(RouteSource::<R>::new(
        config,
        Arc::new(routes),
        services,
    )?))
}

/// Keeps a store in sync with the cluster in a background task
async fn reflect<K>(api: Api<K>) -> Result<Store<K>, Error>
where
    K: Resource + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
    K::DynamicType: Default + Eq + Hash + Clone + Send + Sync,
{
    let kind = K::kind(&K::DynamicType::default()).to_string();
    let (reader, writer) = reflector::store();
    let stream = reflector::reflector(writer, watcher(api, watcher::Config::default()))
        .default_backoff()
        .applied_objects();
    tokio::spawn(async move {
        stream
            .for_each(|event| {
                if let Err(e) = event {
                    warn!(msg = "watch error", kind, err = %e);
                }
                future::ready(())
            })
            .await;
    });
    reader
        .wait_until_ready()
        .await
        .map_err(|e| Error::Watch(e.to_string()))?;
    Ok(reader)
}
