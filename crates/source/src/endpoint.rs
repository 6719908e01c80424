use std::{
    collections::BTreeMap,
    fmt::Display,
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
};

use itertools::Itertools;
use serde::Serialize;

use crate::annotations::RecordMetadata;

/// Label holding the `<kind>/<namespace>/<name>` of the resource an endpoint was generated from
pub const RESOURCE_LABEL_KEY: &str = "resource";
/// Label set on endpoints of resources that requested dual-stack load balancers
pub const DUALSTACK_LABEL_KEY: &str = "dualstack";

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RecordType {
    A,
    AAAA,
    CNAME,
}

impl RecordType {
    fn of_target(target: &str) -> RecordType {
        match target.parse::<IpAddr>() {
            Ok(IpAddr::V4(_)) => RecordType::A,
            Ok(IpAddr::V6(_)) => RecordType::AAAA,
            Err(_) => RecordType::CNAME,
        }
    }
}

impl Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                RecordType::A => "A",
                RecordType::AAAA => "AAAA",
                RecordType::CNAME => "CNAME",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderSpecificProperty {
    pub name: String,
    pub value: String,
}

impl ProviderSpecificProperty {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> ProviderSpecificProperty {
        ProviderSpecificProperty {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A DNS record that should be published for a routing resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub dns_name: String,
    pub targets: Vec<String>,
    /// Seconds, 0 leaves the TTL up to the provider
    pub record_ttl: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub set_identifier: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub provider_specific: Vec<ProviderSpecificProperty>,
    pub labels: BTreeMap<String, String>,
}

impl Endpoint {
    /// Record type derived from the targets.
    ///
    /// IPv4 literals make an A record, IPv6 literals an AAAA record and anything else a CNAME.
    /// Endpoints built by [`endpoints_for_hostname`] never mix target kinds.
    pub fn record_type(&self) -> RecordType {
        if self.targets.iter().all(|t| t.parse::<Ipv4Addr>().is_ok()) {
            RecordType::A
        } else if self.targets.iter().all(|t| t.parse::<Ipv6Addr>().is_ok()) {
            RecordType::AAAA
        } else {
            RecordType::CNAME
        }
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} IN {} {} {:?}",
            self.dns_name,
            self.record_ttl,
            self.record_type(),
            self.targets.join(";"),
            self.labels
        )
    }
}

/// Builds the endpoints for one hostname.
///
/// Targets are grouped by the record type they imply, so a hostname gets one endpoint per
/// type present. A hostname without targets gets nothing.
pub fn endpoints_for_hostname(
    hostname: &str,
    targets: &[String],
    metadata: &RecordMetadata,
) -> Vec<Endpoint> {
    let dns_name = hostname.trim_end_matches('.');
    targets
        .iter()
        .into_group_map_by(|t| RecordType::of_target(t))
        .into_iter()
        .sorted_by_key(|(record_type, _)| *record_type)
        .map(|(_, group)| Endpoint {
            dns_name: dns_name.to_string(),
            targets: group.into_iter().cloned().collect(),
            record_ttl: metadata.ttl,
            set_identifier: metadata.set_identifier.clone(),
            provider_specific: metadata.provider_specific.clone(),
            labels: BTreeMap::new(),
        })
        .collect()
}

/// Sorts the targets of every endpoint so passes over the same resources are comparable
pub fn sort_targets(endpoints: &mut [Endpoint]) {
    for endpoint in endpoints {
        endpoint.targets.sort();
    }
}
