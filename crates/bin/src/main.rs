use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use anyhow::Result;
use clap::Parser;
use tokio::sync::Notify;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use route_dns_source::{Error, SourceConfig, SourceKind, SourceRegistry, source};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Seconds between passes
    #[arg(short, long, env = "ROUTE_DNS_INTERVAL", default_value_t = 60)]
    interval: u32,
    /// Resource kinds to generate endpoints from, all by default
    #[arg(
        long = "source",
        env = "ROUTE_DNS_SOURCES",
        value_delimiter = ',',
        default_values_t = SourceKind::ALL
    )]
    sources: Vec<SourceKind>,
    /// Limit sources to this namespace
    #[arg(long, env = "ROUTE_DNS_NAMESPACE")]
    namespace: Option<String>,
    /// Only use resources whose annotations match this selector,
    /// e.g. `kubernetes.io/ingress.class=contour`
    #[arg(long, env = "ROUTE_DNS_ANNOTATION_FILTER", default_value = "")]
    annotation_filter: String,
    /// Template for hostnames of resources without any, e.g. `{{.Name}}.example.org`
    #[arg(long, env = "ROUTE_DNS_FQDN_TEMPLATE", default_value = "")]
    fqdn_template: String,
    /// Add template hostnames to resources that already have hostnames
    #[arg(long, env = "ROUTE_DNS_COMBINE_FQDN_ANNOTATION", default_value_t = false)]
    combine_fqdn_annotation: bool,
    /// Ignore the hostname annotation
    #[arg(long, env = "ROUTE_DNS_IGNORE_HOSTNAME_ANNOTATION", default_value_t = false)]
    ignore_hostname_annotation: bool,
    /// Skip resources whose controller annotation names another controller
    #[arg(long, env = "ROUTE_DNS_CONTROLLER", default_value = source::DEFAULT_CONTROLLER)]
    controller: String,
    /// Namespace of service references that do not specify one
    #[arg(long, env = "ROUTE_DNS_DEFAULT_NAMESPACE", default_value = source::DEFAULT_NAMESPACE)]
    default_namespace: String,
    /// Load balancer service of Contour, as `namespace/name`
    #[arg(
        long,
        env = "ROUTE_DNS_CONTOUR_LOAD_BALANCER",
        default_value = source::DEFAULT_CONTOUR_LOAD_BALANCER
    )]
    contour_load_balancer: String,
    /// Namespace Gloo proxies live in
    #[arg(long, env = "ROUTE_DNS_GLOO_NAMESPACE", default_value = source::DEFAULT_GLOO_NAMESPACE)]
    gloo_namespace: String,
    /// Fail a source when a resource references missing objects or its template can't be rendered
    #[arg(long, env = "ROUTE_DNS_STRICT", default_value_t = false)]
    strict: bool,
}

impl From<&Args> for SourceConfig {
    fn from(args: &Args) -> Self {
        SourceConfig {
            namespace: args.namespace.clone(),
            annotation_filter: args.annotation_filter.clone(),
            fqdn_template: args.fqdn_template.clone(),
            combine_fqdn_annotation: args.combine_fqdn_annotation,
            ignore_hostname_annotation: args.ignore_hostname_annotation,
            controller: args.controller.clone(),
            default_namespace: args.default_namespace.clone(),
            contour_load_balancer: args.contour_load_balancer.clone(),
            gloo_namespace: args.gloo_namespace.clone(),
            strict: args.strict,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer()
        .json()
        .with_level(true)
        .with_current_span(false)
        .with_span_list(false)
        .with_target(true);
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    let config = SourceConfig::from(&args);
    let registry = SourceRegistry::try_default(&config, &args.sources).await?;
    info!(msg = "Sources ready", sources = ?registry.kinds());

    let cancel = Arc::new(AtomicBool::new(false));
    let shutdown = Arc::new(Notify::new());
    tokio::spawn({
        let cancel = cancel.clone();
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(msg = "Failed to listen for shutdown signal", err = ?e);
                return;
            }
            info!(msg = "Shutting down");
            cancel.store(true, Ordering::Relaxed);
            shutdown.notify_one();
        }
    });

    loop {
        match registry.endpoints(&cancel) {
            Ok(output) => {
                for (source, err) in &output.errors {
                    warn!(
                        msg = "Source failed, its endpoints are missing from this pass",
                        source,
                        err = %err
                    );
                }
                info!(
                    msg = "Completed pass",
                    count = output.endpoints.len(),
                    endpoints = serde_json::to_string(&output.endpoints)?
                );
            }
            Err(Error::Cancelled) => break,
            Err(e) => {
                error!(msg = "Failed to generate endpoints", err = ?e);
            }
        };
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(args.interval.into())) => {}
            _ = shutdown.notified() => break,
        }
    }
    Ok(())
}
