use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use itertools::Itertools;
use k8s_openapi::api::core::v1::Service;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    annotations::{self, RecordMetadata},
    endpoint::{
        DUALSTACK_LABEL_KEY, Endpoint, RESOURCE_LABEL_KEY, endpoints_for_hostname, sort_targets,
    },
    error::Error,
    filter::ResourceFilter,
    hostnames::HostnameResolver,
    kinds::{GlooVirtualHost, GlooVirtualHosts, Proxy, VirtualService},
    route::RouteObject,
    selector::AnnotationSelector,
    snapshot::{IndexedSnapshot, Snapshot},
    targets::{ServiceReference, TargetResolver},
    template::FqdnTemplate,
};

pub const DEFAULT_CONTROLLER: &str = "dns-controller";
pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_CONTOUR_LOAD_BALANCER: &str = "heptio-contour/contour";
pub const DEFAULT_GLOO_NAMESPACE: &str = "gloo-system";

#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Only watch this namespace, all namespaces if unset
    pub namespace: Option<String>,
    /// Annotation selector resources have to match, empty matches everything
    pub annotation_filter: String,
    /// Template for hostnames of resources that declare none, empty disables it
    pub fqdn_template: String,
    /// Add template hostnames to every resource instead of only using them as a fallback
    pub combine_fqdn_annotation: bool,
    pub ignore_hostname_annotation: bool,
    /// Resources claimed by another controller through the controller annotation are skipped
    pub controller: String,
    /// Namespace of service references that do not name one
    pub default_namespace: String,
    /// `namespace/name` of the service fronting Contour, used for IngressRoutes
    pub contour_load_balancer: String,
    pub gloo_namespace: String,
    /// Fail the pass on lookup and template errors instead of skipping the resource
    pub strict: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            namespace: None,
            annotation_filter: String::new(),
            fqdn_template: String::new(),
            combine_fqdn_annotation: false,
            ignore_hostname_annotation: false,
            controller: DEFAULT_CONTROLLER.to_string(),
            default_namespace: DEFAULT_NAMESPACE.to_string(),
            contour_load_balancer: DEFAULT_CONTOUR_LOAD_BALANCER.to_string(),
            gloo_namespace: DEFAULT_GLOO_NAMESPACE.to_string(),
            strict: false,
        }
    }
}

/// Something that produces endpoints from the current state of the cluster
pub trait Source: Send + Sync {
    fn kind(&self) -> &'static str;

    /// Runs one pass. `cancel` is checked before every resource, a cancelled pass returns
    /// [`Error::Cancelled`] and no endpoints.
    fn endpoints(&self, cancel: &AtomicBool) -> Result<Vec<Endpoint>, Error>;
}

/// Generates endpoints for every object of one routing kind
pub struct RouteSource<R: RouteObject> {
    namespace: Option<String>,
    routes: Arc<dyn Snapshot<R>>,
    filter: ResourceFilter,
    targets: TargetResolver,
    hostnames: HostnameResolver,
    strict: bool,
}

impl<R: RouteObject> RouteSource<R> {
    pub fn new(
        config: &SourceConfig,
        routes: Arc<dyn Snapshot<R>>,
        services: Arc<dyn IndexedSnapshot<Service>>,
    ) -> Result<RouteSource<R>, Error> {
        let selector = AnnotationSelector::parse(&config.annotation_filter)?;
        let template = FqdnTemplate::parse(&config.fqdn_template)?;
        let static_service = R::static_service(config)
            .map(|reference| ServiceReference::parse(reference, &config.default_namespace))
            .transpose()
            .map_err(|e| Error::Configuration(e.to_string()))?;

        Ok(RouteSource {
            namespace: config.namespace.clone(),
            routes,
            filter: ResourceFilter::new(selector, config.controller.clone()),
            targets: TargetResolver::new(
                services,
                static_service,
                config.default_namespace.clone(),
            ),
            hostnames: HostnameResolver::new(
                template,
                config.combine_fqdn_annotation,
                config.ignore_hostname_annotation,
            ),
            strict: config.strict,
        })
    }

    fn route_endpoints(&self, route: &R) -> Result<Vec<Endpoint>, Error> {
        let annotations = route.route_annotations();
        if !self.filter.keep(route, &annotations) {
            return Ok(vec![]);
        }
        let resource = route.resource_id();

        let targets = self.targets.resolve(route, &annotations)?;
        let hostnames = self.hostnames.resolve(route, &annotations)?;
        if hostnames.is_empty() {
            debug!(msg = "no hostnames for resource", resource);
            return Ok(vec![]);
        }

        let metadata = RecordMetadata::from_annotations(&annotations, &resource);
        let mut endpoints = hostnames
            .iter()
            .flat_map(|hostname| endpoints_for_hostname(hostname, &targets, &metadata))
            .collect_vec();
        if endpoints.is_empty() {
            debug!(msg = "no targets for resource", resource, hostnames = ?hostnames);
            return Ok(endpoints);
        }

        let dualstack = annotations::is_dualstack(&annotations);
        for endpoint in &mut endpoints {
            endpoint
                .labels
                .insert(RESOURCE_LABEL_KEY.to_string(), resource.clone());
            if dualstack {
                endpoint
                    .labels
                    .insert(DUALSTACK_LABEL_KEY.to_string(), "true".to_string());
            }
        }
        debug!(msg = "endpoints generated", resource, count = endpoints.len());
        Ok(endpoints)
    }
}

impl RouteSource<GlooVirtualHost> {
    /// Proxies are read from `gloo_namespace` only, whatever namespace the other sources are
    /// limited to
    pub fn gloo(
        config: &SourceConfig,
        proxies: Arc<dyn Snapshot<Proxy>>,
        virtual_services: Arc<dyn IndexedSnapshot<VirtualService>>,
        services: Arc<dyn IndexedSnapshot<Service>>,
    ) -> Result<RouteSource<GlooVirtualHost>, Error> {
        let config = SourceConfig {
            namespace: Some(config.gloo_namespace.clone()),
            ..config.clone()
        };
        RouteSource::new(
            &config,
            Arc::new(GlooVirtualHosts::new(proxies, virtual_services)),
            services,
        )
    }
}

impl<R: RouteObject> Source for RouteSource<R> {
    fn kind(&self) -> &'static str {
        R::KIND
    }

    #[instrument(skip(self, cancel), fields(kind = R::KIND))]
    fn endpoints(&self, cancel: &AtomicBool) -> Result<Vec<Endpoint>, Error> {
        let mut endpoints = vec![];
        for route in self.routes.list(self.namespace.as_deref()) {
            if cancel.load(Ordering::Relaxed) {
                info!(msg = "pass cancelled");
                return Err(Error::Cancelled);
            }
            match self.route_endpoints(&route) {
                Ok(route_endpoints) => endpoints.extend(route_endpoints),
                Err(e) if e.is_resource_scoped() && !self.strict => {
                    warn!(msg = "skipping resource", resource = route.resource_id(), err = %e);
                }
                Err(e) => {
                    error!(
                        msg = "failed to generate endpoints",
                        resource = route.resource_id(),
                        err = %e
                    );
                    return Err(e);
                }
            }
        }
        sort_targets(&mut endpoints);
        Ok(endpoints)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use anyhow::Result;
    use k8s_openapi::api::core::v1::{
        LoadBalancerIngress, LoadBalancerStatus, ServiceSpec, ServiceStatus,
    };
    use kube::{Resource, api::ObjectMeta};

    use super::*;
    use crate::{
        annotations::{
            AMBASSADOR_SERVICE_ANNOTATION, CONTROLLER_ANNOTATION, DUALSTACK_ANNOTATION,
            HOSTNAME_ANNOTATION, SET_IDENTIFIER_ANNOTATION, TARGET_ANNOTATION, TTL_ANNOTATION,
        },
        endpoint::{ProviderSpecificProperty, RecordType},
        kinds::{
            HTTPProxy, Host, IngressRoute, TCPIngress,
            ambassador::HostSpec,
            contour::{
                HttpProxySpec, HttpProxyStatus, IngressRouteSpec, IngressRouteStatus, VirtualHost,
            },
            gloo::{HttpListener, Listener, ProxySpec, VirtualHost as GlooHost},
            kong::{TcpIngressRule, TcpIngressSpec, TcpIngressStatus},
        },
        snapshot::StaticSnapshot,
    };

    fn ingress(addrs: &[&str]) -> Vec<LoadBalancerIngress> {
        addrs
            .iter()
            .map(|addr| match addr.parse::<std::net::IpAddr>() {
                Ok(_) => LoadBalancerIngress {
                    ip: Some(addr.to_string()),
                    ..Default::default()
                },
                Err(_) => LoadBalancerIngress {
                    hostname: Some(addr.to_string()),
                    ..Default::default()
                },
            })
            .collect()
    }

    fn meta(namespace: &str, name: &str, annotations: &[(&str, &str)]) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            annotations: Some(
                annotations
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
            ..Default::default()
        }
    }

    fn service(namespace: &str, name: &str, addrs: &[&str]) -> Service {
        Service {
            metadata: meta(namespace, name, &[]),
            spec: Some(ServiceSpec {
                type_: Some("LoadBalancer".to_string()),
                ..Default::default()
            }),
            status: Some(ServiceStatus {
                load_balancer: Some(LoadBalancerStatus {
                    ingress: Some(ingress(addrs)),
                }),
                ..Default::default()
            }),
        }
    }

    fn services() -> Arc<dyn IndexedSnapshot<Service>> {
        Arc::new(StaticSnapshot::new([
            service("heptio-contour", "contour", &["1.2.3.4"]),
            service("ambassador", "ambassador", &["lb.ambassador.com"]),
            service("gloo-system", "gateway-proxy", &["10.1.1.1"]),
        ]))
    }

    fn http_proxy(
        name: &str,
        fqdn: &str,
        annotations: &[(&str, &str)],
        lb: &[&str],
    ) -> HTTPProxy {
        let mut proxy = HTTPProxy::new(
            name,
            HttpProxySpec {
                virtualhost: Some(VirtualHost {
                    fqdn: fqdn.to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            },
        );
        proxy.metadata = meta("default", name, annotations);
        proxy.status = Some(HttpProxyStatus {
            current_status: Some("valid".to_string()),
            load_balancer: Some(LoadBalancerStatus {
                ingress: Some(ingress(lb)),
            }),
            ..Default::default()
        });
        proxy
    }

    fn host(name: &str, hostname: &str, reference: &str) -> Host {
        let mut host = Host::new(
            name,
            HostSpec {
                hostname: Some(hostname.to_string()),
                ..Default::default()
            },
        );
        host.metadata = meta("default", name, &[(AMBASSADOR_SERVICE_ANNOTATION, reference)]);
        host
    }

    fn source<R: RouteObject + Resource>(
        config: &SourceConfig,
        routes: impl IntoIterator<Item = R>,
    ) -> Result<RouteSource<R>, Error> {
        RouteSource::new(config, Arc::new(StaticSnapshot::new(routes)), services())
    }

    fn run(source: &impl Source) -> Result<Vec<Endpoint>, Error> {
        source.endpoints(&AtomicBool::new(false))
    }

    fn names(endpoints: &[Endpoint]) -> Vec<&str> {
        endpoints.iter().map(|e| e.dns_name.as_str()).collect()
    }

    const CLASS: &str = "kubernetes.io/ingress.class";

    #[test]
    fn filtered_resources_produce_nothing() -> Result<()> {
        let config = SourceConfig {
            annotation_filter: "kubernetes.io/ingress.class=contour".to_string(),
            ..Default::default()
        };
        let source = source(
            &config,
            [
                http_proxy("a", "a.example.org", &[(CLASS, "contour")], &["8.8.8.8"]),
                http_proxy("b", "b.example.org", &[(CLASS, "alb")], &["8.8.8.8"]),
                http_proxy("c", "c.example.org", &[], &["8.8.8.8"]),
                http_proxy(
                    "d",
                    "d.example.org",
                    &[(CLASS, "contour"), (CONTROLLER_ANNOTATION, "other")],
                    &["8.8.8.8"],
                ),
            ],
        )?;
        assert_eq!(names(&run(&source)?), vec!["a.example.org"]);
        Ok(())
    }

    #[test]
    fn invalid_resources_produce_nothing() -> Result<()> {
        let mut invalid = http_proxy("a", "a.example.org", &[], &["8.8.8.8"]);
        if let Some(status) = invalid.status.as_mut() {
            status.current_status = Some("invalid".to_string());
        }
        let source = source(&SourceConfig::default(), [invalid])?;
        assert!(run(&source)?.is_empty());
        Ok(())
    }

    #[test]
    fn passes_are_idempotent_with_sorted_targets() -> Result<()> {
        let source = source(
            &SourceConfig::default(),
            [
                http_proxy("b", "b.example.org", &[], &["8.8.8.8", "1.1.1.1"]),
                http_proxy("a", "a.example.org", &[], &["lb-2.com", "lb-1.com"]),
            ],
        )?;
        let first = run(&source)?;
        assert_eq!(first, run(&source)?);
        assert_eq!(names(&first), vec!["a.example.org", "b.example.org"]);
        for endpoint in &first {
            assert!(endpoint.targets.is_sorted());
        }
        assert_eq!(first[1].targets, vec!["1.1.1.1", "8.8.8.8"]);
        Ok(())
    }

    #[test]
    fn target_annotation_overrides_status() -> Result<()> {
        let source = source(
            &SourceConfig::default(),
            [http_proxy(
                "a",
                "a.example.org",
                &[(TARGET_ANNOTATION, "1.2.3.4")],
                &["8.8.8.8", "lb.com"],
            )],
        )?;
        let endpoints = run(&source)?;
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].targets, vec!["1.2.3.4"]);
        assert_eq!(endpoints[0].record_type(), RecordType::A);
        Ok(())
    }

    #[test]
    fn mixed_targets_are_split_by_record_type() -> Result<()> {
        let source = source(
            &SourceConfig::default(),
            [http_proxy("a", "a.example.org", &[], &["lb.com", "8.8.8.8", "2001:db8::1"])],
        )?;
        let types = run(&source)?
            .iter()
            .map(|e| (e.record_type(), e.targets.clone()))
            .collect_vec();
        assert_eq!(
            types,
            vec![
                (RecordType::A, vec!["8.8.8.8".to_string()]),
                (RecordType::AAAA, vec!["2001:db8::1".to_string()]),
                (RecordType::CNAME, vec!["lb.com".to_string()]),
            ]
        );
        Ok(())
    }

    #[test]
    fn template_hostnames() -> Result<()> {
        let config = SourceConfig {
            fqdn_template: "{{.Name}}.ext-dns.test.com".to_string(),
            ..Default::default()
        };
        let source = source(
            &config,
            [
                http_proxy("fake1", "", &[], &["8.8.8.8"]),
                http_proxy("fake2", "foo.bar", &[], &["8.8.8.8"]),
            ],
        )?;
        assert_eq!(names(&run(&source)?), vec!["fake1.ext-dns.test.com", "foo.bar"]);

        let combined = source_with_combine()?;
        assert_eq!(
            names(&run(&combined)?),
            vec!["foo.bar", "alias.bar", "fake2.a.com", "fake2.b.com"]
        );
        Ok(())
    }

    fn source_with_combine() -> Result<RouteSource<HTTPProxy>, Error> {
        let config = SourceConfig {
            fqdn_template: "{{.Name}}.a.com, {{.Name}}.b.com".to_string(),
            combine_fqdn_annotation: true,
            ..Default::default()
        };
        source(
            &config,
            [http_proxy("fake2", "foo.bar", &[(HOSTNAME_ANNOTATION, "alias.bar")], &["8.8.8.8"])],
        )
    }

    #[test]
    fn labels_and_record_metadata() -> Result<()> {
        let source = source(
            &SourceConfig::default(),
            [http_proxy(
                "a",
                "a.example.org",
                &[
                    (TTL_ANNOTATION, "1m"),
                    (SET_IDENTIFIER_ANNOTATION, "eu"),
                    ("external-dns.alpha.kubernetes.io/aws-weight", "10"),
                    (DUALSTACK_ANNOTATION, "dualstack"),
                ],
                &["8.8.8.8"],
            )],
        )?;
        let endpoints = run(&source)?;
        assert_eq!(endpoints.len(), 1);
        let endpoint = &endpoints[0];
        assert_eq!(endpoint.record_ttl, 60);
        assert_eq!(endpoint.set_identifier, "eu");
        assert_eq!(
            endpoint.provider_specific,
            vec![ProviderSpecificProperty::new("aws/weight", "10")]
        );
        assert_eq!(
            endpoint.labels,
            BTreeMap::from([
                (DUALSTACK_LABEL_KEY.to_string(), "true".to_string()),
                (RESOURCE_LABEL_KEY.to_string(), "HTTPProxy/default/a".to_string()),
            ])
        );
        Ok(())
    }

    #[test]
    fn bad_ttl_does_not_drop_the_resource() -> Result<()> {
        let source = source(
            &SourceConfig::default(),
            [http_proxy("a", "a.example.org", &[(TTL_ANNOTATION, "forever")], &["8.8.8.8"])],
        )?;
        let endpoints = run(&source)?;
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].record_ttl, 0);
        Ok(())
    }

    #[test]
    fn missing_service_is_soft_unless_strict() -> Result<()> {
        let hosts = || {
            [
                host("a", "a.example.org", "ambassador/missing"),
                host("b", "b.example.org", "ambassador.ambassador"),
            ]
        };
        let lenient = source(&SourceConfig::default(), hosts())?;
        let endpoints = run(&lenient)?;
        assert_eq!(names(&endpoints), vec!["b.example.org"]);
        assert_eq!(endpoints[0].targets, vec!["lb.ambassador.com"]);

        let config = SourceConfig {
            strict: true,
            ..Default::default()
        };
        let strict = source(&config, hosts())?;
        assert!(matches!(run(&strict), Err(Error::Lookup { .. })));
        Ok(())
    }

    #[test]
    fn malformed_reference_fails_the_pass() -> Result<()> {
        let source = source(
            &SourceConfig::default(),
            [
                host("a", "a.example.org", "a/b/c"),
                host("b", "b.example.org", "ambassador/ambassador"),
            ],
        )?;
        assert!(matches!(run(&source), Err(Error::ReferenceFormat(_))));
        Ok(())
    }

    #[test]
    fn hosts_need_the_service_annotation() -> Result<()> {
        let mut unannotated = host("a", "a.example.org", "ambassador/ambassador");
        unannotated.metadata.annotations = None;
        let source = source(&SourceConfig::default(), [unannotated])?;
        assert!(run(&source)?.is_empty());
        Ok(())
    }

    #[test]
    fn render_failure_is_soft_unless_strict() -> Result<()> {
        let routes = || {
            [
                http_proxy("a", "", &[], &["8.8.8.8"]),
                http_proxy("b", "b.example.org", &[], &["8.8.8.8"]),
            ]
        };
        let mut config = SourceConfig {
            fqdn_template: "{{.Missing}}.example.org".to_string(),
            ..Default::default()
        };
        assert_eq!(names(&run(&source(&config, routes())?)?), vec!["b.example.org"]);

        config.strict = true;
        assert!(matches!(
            run(&source(&config, routes())?),
            Err(Error::TemplateRender(_))
        ));
        Ok(())
    }

    #[test]
    fn cancelled_pass_returns_nothing() -> Result<()> {
        let source = source(
            &SourceConfig::default(),
            [http_proxy("a", "a.example.org", &[], &["8.8.8.8"])],
        )?;
        assert!(matches!(
            source.endpoints(&AtomicBool::new(true)),
            Err(Error::Cancelled)
        ));
        Ok(())
    }

    #[test]
    fn bad_configuration_is_rejected() {
        let bad_filter = SourceConfig {
            annotation_filter: "a in (b".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            source::<HTTPProxy>(&bad_filter, []),
            Err(Error::Configuration(_))
        ));

        let bad_template = SourceConfig {
            fqdn_template: "{{.Name".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            source::<HTTPProxy>(&bad_template, []),
            Err(Error::Configuration(_))
        ));

        let bad_load_balancer = SourceConfig {
            contour_load_balancer: "a/b/c".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            source::<IngressRoute>(&bad_load_balancer, []),
            Err(Error::Configuration(_))
        ));
        // only IngressRoutes use the static load balancer
        assert!(source::<HTTPProxy>(&bad_load_balancer, []).is_ok());
    }

    #[test]
    fn namespace_scope() -> Result<()> {
        let mut other = http_proxy("b", "b.example.org", &[], &["8.8.8.8"]);
        other.metadata.namespace = Some("other".to_string());
        let config = SourceConfig {
            namespace: Some("other".to_string()),
            ..Default::default()
        };
        let source = source(&config, [http_proxy("a", "a.example.org", &[], &["8.8.8.8"]), other])?;
        assert_eq!(names(&run(&source)?), vec!["b.example.org"]);
        Ok(())
    }

    #[test]
    fn ingress_routes_use_the_contour_service() -> Result<()> {
        let mut route = IngressRoute::new(
            "route",
            IngressRouteSpec {
                virtualhost: Some(VirtualHost {
                    fqdn: "route.example.org".to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            },
        );
        route.metadata = meta("default", "route", &[]);
        route.status = Some(IngressRouteStatus {
            current_status: Some("valid".to_string()),
            ..Default::default()
        });
        let endpoints = run(&source(&SourceConfig::default(), [route])?)?;
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].targets, vec!["1.2.3.4"]);
        assert_eq!(
            endpoints[0].labels.get(RESOURCE_LABEL_KEY).map(String::as_str),
            Some("ingressroute/default/route")
        );
        Ok(())
    }

    #[test]
    fn kong_tcp_ingress() -> Result<()> {
        let mut tcp = TCPIngress::new(
            "tcp",
            TcpIngressSpec {
                rules: vec![
                    TcpIngressRule {
                        host: Some("a.example.org".to_string()),
                        port: 30000,
                        ..Default::default()
                    },
                    TcpIngressRule {
                        host: Some("b.example.org".to_string()),
                        port: 30001,
                        ..Default::default()
                    },
                ],
                ..Default::default()
            },
        );
        tcp.metadata = meta("kong", "tcp", &[(HOSTNAME_ANNOTATION, "c.example.org")]);
        tcp.status = Some(TcpIngressStatus {
            load_balancer: Some(LoadBalancerStatus {
                ingress: Some(ingress(&["kong.elb.com"])),
            }),
            ..Default::default()
        });
        let endpoints = run(&source(&SourceConfig::default(), [tcp])?)?;
        assert_eq!(
            names(&endpoints),
            vec!["a.example.org", "b.example.org", "c.example.org"]
        );
        assert!(endpoints.iter().all(|e| e.targets == vec!["kong.elb.com"]));
        Ok(())
    }

    fn gloo_proxy() -> Proxy {
        let mut proxy = Proxy::new(
            "gateway-proxy",
            ProxySpec {
                listeners: vec![Listener {
                    http_listener: HttpListener {
                        virtual_hosts: vec![
                            GlooHost {
                                domains: vec!["a.example.org".to_string()],
                                ..Default::default()
                            },
                            GlooHost {
                                domains: vec![
                                    "b.example.org".to_string(),
                                    "c.example.org".to_string(),
                                ],
                                ..Default::default()
                            },
                        ],
                        ..Default::default()
                    },
                    ..Default::default()
                }],
                ..Default::default()
            },
        );
        proxy.metadata = meta("gloo-system", "gateway-proxy", &[]);
        proxy
    }

    #[test]
    fn gloo_virtual_hosts() -> Result<()> {
        let source = RouteSource::gloo(
            &SourceConfig::default(),
            Arc::new(StaticSnapshot::new([gloo_proxy()])),
            Arc::new(StaticSnapshot::<VirtualService>::default()),
            services(),
        )?;
        let endpoints = run(&source)?;
        assert_eq!(
            names(&endpoints),
            vec!["a.example.org", "b.example.org", "c.example.org"]
        );
        assert!(endpoints.iter().all(|e| e.targets == vec!["10.1.1.1"]));
        assert_eq!(source.kind(), "proxy");
        Ok(())
    }

    #[test]
    fn gloo_proxies_ignore_the_namespace_scope() -> Result<()> {
        let mut elsewhere = gloo_proxy();
        elsewhere.metadata.namespace = Some("apps".to_string());
        if let Some(vhost) = elsewhere.spec.listeners[0].http_listener.virtual_hosts.get_mut(0) {
            vhost.domains = vec!["elsewhere.example.org".to_string()];
        }
        let config = SourceConfig {
            namespace: Some("apps".to_string()),
            ..Default::default()
        };
        let source = RouteSource::gloo(
            &config,
            Arc::new(StaticSnapshot::new([gloo_proxy(), elsewhere])),
            Arc::new(StaticSnapshot::<VirtualService>::default()),
            services(),
        )?;
        assert_eq!(
            names(&run(&source)?),
            vec!["a.example.org", "b.example.org", "c.example.org"]
        );
        Ok(())
    }

    #[test]
    fn templates_read_untyped_fields() -> Result<()> {
        let proxy: HTTPProxy = serde_json::from_value(serde_json::json!({
            "apiVersion": "projectcontour.io/v1",
            "kind": "HTTPProxy",
            "metadata": { "name": "fake1", "namespace": "default" },
            "spec": {
                "virtualhost": { "fqdn": "", "tls": { "secretName": "cert" } },
                "routes": [{ "services": [{ "name": "app", "port": 80 }] }]
            },
            "status": {
                "currentStatus": "valid",
                "loadBalancer": { "ingress": [{ "ip": "8.8.8.8" }] }
            }
        }))?;
        let config = SourceConfig {
            fqdn_template: "{{.Spec.VirtualHost.Tls.SecretName}}.example.org".to_string(),
            strict: true,
            ..Default::default()
        };
        let endpoints = run(&source(&config, [proxy])?)?;
        assert_eq!(names(&endpoints), vec!["cert.example.org"]);
        Ok(())
    }
}
