use std::fmt;

use snafu::Snafu;

/// Kind of catalog resource a directive refers to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResourceKind {
    InitContainer,
    Container,
    Volume,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InitContainer => "init container",
            Self::Container => "container",
            Self::Volume => "volume",
        })
    }
}

/// Fatal errors of a single injection request.
///
/// Every variant is a deterministic function of the pod and the catalog, so
/// retrying a failed request with the same inputs fails the same way.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// The inbound object cannot be decoded as a pod.
    #[snafu(display("Failed to decode pod, error: {source}"))]
    BadRequest { source: serde_json::Error },

    /// A directive names a resource the catalog does not define.
    #[snafu(display("The {kind} '{name}' was not found in the catalog"))]
    ResourceNotFound { kind: ResourceKind, name: String },

    /// An injector rule carries a label selector that cannot be evaluated.
    #[snafu(display("Injector rule #{index} has a malformed label selector, error: {source}"))]
    BadConfiguration { index: usize, source: kube::core::ParseExpressionError },

    /// The mutated pod cannot be serialized.
    #[snafu(display("Failed to serialize mutated pod, error: {source}"))]
    Serialization { source: serde_json::Error },
}

impl Error {
    /// HTTP status a transport should answer with when rejecting the request.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest { .. } | Self::ResourceNotFound { .. } => 400,
            Self::BadConfiguration { .. } | Self::Serialization { .. } => 500,
        }
    }
}
