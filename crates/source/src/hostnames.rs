use itertools::Itertools;

use crate::{
    annotations::{self, Annotations},
    route::RouteObject,
    template::{FqdnTemplate, RenderError},
};

/// Collects the hostnames of a route from its spec, the hostname annotation and the FQDN
/// template.
///
/// Spec hostnames come first, then annotation hostnames. The template is only consulted when
/// neither yielded anything, or on every route when `combine` is set, in which case its
/// hostnames are appended.
#[derive(Debug, Clone, Default)]
pub struct HostnameResolver {
    template: Option<FqdnTemplate>,
    combine: bool,
    ignore_annotation: bool,
}

impl HostnameResolver {
    pub fn new(
        template: Option<FqdnTemplate>,
        combine: bool,
        ignore_annotation: bool,
    ) -> HostnameResolver {
        HostnameResolver {
            template,
            combine,
            ignore_annotation,
        }
    }

    pub fn resolve<R: RouteObject>(
        &self,
        route: &R,
        annotations: &Annotations,
    ) -> Result<Vec<String>, RenderError> {
        let mut hostnames = route
            .spec_hostnames()
            .iter()
            .map(|h| h.trim().trim_end_matches('.').to_string())
            .filter(|h| !h.is_empty())
            .collect_vec();
        if !self.ignore_annotation {
            hostnames.extend(annotations::hostnames(annotations));
        }

        if let Some(template) = &self.template
            && (self.combine || hostnames.is_empty())
        {
            hostnames.extend(template.hostnames(route, &route.resource_id())?);
        }
        Ok(hostnames)
    }
}
