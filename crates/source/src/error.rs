use crate::{
    selector::SelectorError,
    targets::ReferenceError,
    template::{RenderError, TemplateError},
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid source configuration: `{0}`")]
    Configuration(String),
    #[error("Malformed service reference: `{0}`")]
    ReferenceFormat(ReferenceError),
    #[error("Referenced {kind} {namespace}/{name} not found")]
    Lookup {
        kind: &'static str,
        namespace: String,
        name: String,
    },
    #[error("Template error: `{0}`")]
    TemplateRender(RenderError),
    #[error("Pass was cancelled")]
    Cancelled,
    #[error("Kube error: `{0}`")]
    Kube(kube::Error),
    #[error("Watch error: `{0}`")]
    Watch(String),
}

impl From<SelectorError> for Error {
    fn from(value: SelectorError) -> Self {
        Error::Configuration(value.to_string())
    }
}

impl From<TemplateError> for Error {
    fn from(value: TemplateError) -> Self {
        Error::Configuration(value.to_string())
    }
}

impl From<RenderError> for Error {
    fn from(value: RenderError) -> Self {
        Error::TemplateRender(value)
    }
}

impl From<ReferenceError> for Error {
    fn from(value: ReferenceError) -> Self {
        Error::ReferenceFormat(value)
    }
}

impl From<kube::Error> for Error {
    fn from(value: kube::Error) -> Self {
        Error::Kube(value)
    }
}

impl Error {
    /// Whether the error only concerns one resource and may be skipped in lenient mode.
    pub fn is_resource_scoped(&self) -> bool {
        matches!(self, Error::Lookup { .. } | Error::TemplateRender(_))
    }
}
