use std::{collections::HashSet, fmt};

use k8s_openapi::api::core::v1::Pod;

use crate::{
    catalog::Catalog,
    error::{Error, ResourceKind},
    ext::PodExt,
    matcher::{self, MatchedResources},
};

/// Why a pod is admitted without changes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SkipReason {
    /// The status annotation already records a completed injection.
    AlreadyInjected,
    /// Neither the gate annotation nor an injector rule asks for injection.
    NotRequested,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AlreadyInjected => "pod is already injected",
            Self::NotRequested => "injection was not requested",
        })
    }
}

/// The resources to inject into one pod, in injection order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InjectionDirective {
    pub init_containers: Vec<String>,
    pub containers: Vec<String>,
    pub volumes: Vec<String>,
    pub skip_reason: Option<SkipReason>,
}

impl InjectionDirective {
    const fn skip(reason: SkipReason) -> Self {
        Self {
            init_containers: Vec::new(),
            containers: Vec::new(),
            volumes: Vec::new(),
            skip_reason: Some(reason),
        }
    }

    #[must_use]
    pub const fn should_inject(&self) -> bool { self.skip_reason.is_none() }
}

/// Decides what to inject into `pod`.
///
/// Rule-matched names come first; names listed in the pod's annotations are
/// appended after them. A name is kept only at its first occurrence.
///
/// # Errors
///
/// Returns [`Error::BadConfiguration`] if an injector rule has a malformed
/// selector.
pub fn resolve(pod: &Pod, catalog: &Catalog) -> Result<InjectionDirective, Error> {
    if pod.is_injected() {
        return Ok(InjectionDirective::skip(SkipReason::AlreadyInjected));
    }

    let matched = matcher::match_rules(catalog.rules(), &pod.labels_or_empty())?;

    if !pod.is_injection_enabled() && matched.is_empty() {
        return Ok(InjectionDirective::skip(SkipReason::NotRequested));
    }

    let MatchedResources { init_containers, containers, volumes } = matched;

    Ok(InjectionDirective {
        init_containers: merge(init_containers, pod.requested_names(ResourceKind::InitContainer)),
        containers: merge(containers, pod.requested_names(ResourceKind::Container)),
        volumes: merge(volumes, pod.requested_names(ResourceKind::Volume)),
        skip_reason: None,
    })
}

fn merge(from_rules: Vec<String>, from_annotations: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    from_rules.into_iter().chain(from_annotations).filter(|name| seen.insert(name.clone())).collect()
}
