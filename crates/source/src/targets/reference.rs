use std::fmt::Display;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid load balancer service reference `{0}`")]
pub struct ReferenceError(pub String);

/// Namespace and name of a service that carries load balancer addresses
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceReference {
    pub namespace: String,
    pub name: String,
}

impl ServiceReference {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> ServiceReference {
        ServiceReference {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Parses `namespace/name`, or the older `name.namespace` form.
    ///
    /// The dotted form splits on the first dot only, so `svc.foo.bar` is service `svc` in
    /// namespace `foo.bar`. A bare name lives in `default_namespace`.
    pub fn parse(
        reference: &str,
        default_namespace: &str,
    ) -> Result<ServiceReference, ReferenceError> {
        let invalid = || ReferenceError(reference.to_string());
        let reference = reference.trim();
        let parts = reference.split('/').collect::<Vec<_>>();
        let (namespace, name) = match parts.as_slice() {
            [single] => match single.split_once('.') {
                Some((name, namespace)) => (namespace, name),
                None => (default_namespace, *single),
            },
            [namespace, name] => (*namespace, *name),
            _ => return Err(invalid()),
        };
        if namespace.is_empty() || name.is_empty() {
            return Err(invalid());
        }
        Ok(ServiceReference::new(namespace, name))
    }
}

impl Display for ServiceReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
