//! Annotation vocabulary shared by all route kinds, and the metadata extracted from it.

use std::collections::BTreeMap;

use itertools::Itertools;
use thiserror::Error;
use tracing::warn;

use crate::endpoint::ProviderSpecificProperty;

const ANNOTATION_PREFIX: &str = "external-dns.alpha.kubernetes.io/";

pub const TARGET_ANNOTATION: &str = "external-dns.alpha.kubernetes.io/target";
pub const HOSTNAME_ANNOTATION: &str = "external-dns.alpha.kubernetes.io/hostname";
pub const TTL_ANNOTATION: &str = "external-dns.alpha.kubernetes.io/ttl";
pub const CONTROLLER_ANNOTATION: &str = "external-dns.alpha.kubernetes.io/controller";
pub const SET_IDENTIFIER_ANNOTATION: &str = "external-dns.alpha.kubernetes.io/set-identifier";
pub const ALIAS_ANNOTATION: &str = "external-dns.alpha.kubernetes.io/alias";
pub const CLOUDFLARE_PROXIED_ANNOTATION: &str =
    "external-dns.alpha.kubernetes.io/cloudflare-proxied";
pub const DUALSTACK_ANNOTATION: &str = "alb.ingress.kubernetes.io/ip-address-type";
pub const DUALSTACK_ANNOTATION_VALUE: &str = "dualstack";
/// Service an Ambassador Host is exposed through, `namespace/name` or `name.namespace`
pub const AMBASSADOR_SERVICE_ANNOTATION: &str = "external-dns.ambassador-service";

/// Vendor annotation prefixes and the short form their properties are published under
const PROVIDER_PREFIXES: [(&str, &str); 2] = [("aws-", "aws/"), ("scw-", "scw/")];

const TTL_MAX: i64 = i32::MAX as i64;

pub type Annotations = BTreeMap<String, String>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid TTL annotation `{value}`: {reason}")]
pub struct TtlError {
    pub value: String,
    pub reason: String,
}

/// Record settings taken from a resource's annotations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordMetadata {
    pub ttl: i64,
    pub set_identifier: String,
    pub provider_specific: Vec<ProviderSpecificProperty>,
}

impl RecordMetadata {
    /// Never fails, a bad TTL is logged and left to the provider default.
    pub fn from_annotations(annotations: &Annotations, resource: &str) -> RecordMetadata {
        let ttl = match ttl(annotations) {
            Ok(ttl) => ttl.unwrap_or_default(),
            Err(e) => {
                warn!(msg = "ignoring TTL annotation", resource, err = %e);
                0
            }
        };
        RecordMetadata {
            ttl,
            set_identifier: set_identifier(annotations),
            provider_specific: provider_specific(annotations),
        }
    }
}

/// TTL in seconds, as a plain integer (`"60"`) or a duration (`"1m"`, `"10s"`)
pub fn ttl(annotations: &Annotations) -> Result<Option<i64>, TtlError> {
    let Some(value) = annotations.get(TTL_ANNOTATION) else {
        return Ok(None);
    };
    let secs = match value.trim().parse::<i64>() {
        Ok(secs) => secs,
        Err(_) => humantime::parse_duration(value.trim())
            .map_err(|e| TtlError {
                value: value.clone(),
                reason: e.to_string(),
            })
            .and_then(|d| {
                i64::try_from(d.as_secs()).map_err(|e| TtlError {
                    value: value.clone(),
                    reason: e.to_string(),
                })
            })?,
    };
    if !(1..=TTL_MAX).contains(&secs) {
        return Err(TtlError {
            value: value.clone(),
            reason: format!("must be between 1 and {TTL_MAX} seconds"),
        });
    }
    Ok(Some(secs))
}

pub fn set_identifier(annotations: &Annotations) -> String {
    annotations
        .get(SET_IDENTIFIER_ANNOTATION)
        .cloned()
        .unwrap_or_default()
}

pub fn provider_specific(annotations: &Annotations) -> Vec<ProviderSpecificProperty> {
    let mut properties = vec![];
    if let Some(proxied) = annotations.get(CLOUDFLARE_PROXIED_ANNOTATION) {
        properties.push(ProviderSpecificProperty::new(
            CLOUDFLARE_PROXIED_ANNOTATION,
            proxied,
        ));
    }
    if annotations.get(ALIAS_ANNOTATION).map(String::as_str) == Some("true") {
        properties.push(ProviderSpecificProperty::new("alias", "true"));
    }
    properties.extend(annotations.iter().filter_map(|(key, value)| {
        let attr = key.strip_prefix(ANNOTATION_PREFIX)?;
        PROVIDER_PREFIXES.iter().find_map(|(prefix, short)| {
            attr.strip_prefix(prefix)
                .map(|rest| ProviderSpecificProperty::new(format!("{short}{rest}"), value))
        })
    }));
    properties
}

/// Hostnames from the hostname annotation, in annotation order
pub fn hostnames(annotations: &Annotations) -> Vec<String> {
    annotations
        .get(HOSTNAME_ANNOTATION)
        .map(|value| split_hostnames(value))
        .unwrap_or_default()
}

/// Targets from the target override annotation, empty if absent
pub fn targets(annotations: &Annotations) -> Vec<String> {
    annotations
        .get(TARGET_ANNOTATION)
        .map(|value| split_hostnames(value))
        .unwrap_or_default()
}

pub fn is_dualstack(annotations: &Annotations) -> bool {
    annotations.get(DUALSTACK_ANNOTATION).map(String::as_str) == Some(DUALSTACK_ANNOTATION_VALUE)
}

/// Splits a comma separated hostname list, dropping whitespace, empty entries and trailing dots
pub fn split_hostnames(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| {
            entry
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
        })
        .map(|entry| entry.trim_end_matches('.').to_string())
        .filter(|entry| !entry.is_empty())
        .collect_vec()
}
