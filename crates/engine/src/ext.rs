//! Typed access to the injector's annotation vocabulary on a [`Pod`].

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Pod;
use sidecar_injector_base::consts::k8s::annotations;

use crate::error::ResourceKind;

/// Position a catalog container is injected at. The phase selects which
/// annotation lists the container and which prefix its resource overrides
/// use.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    InitContainers,
    Containers,
}

impl Phase {
    #[must_use]
    pub fn annotation_key(self) -> &'static str {
        match self {
            Self::InitContainers => annotations::INIT_CONTAINERS.as_str(),
            Self::Containers => annotations::CONTAINERS.as_str(),
        }
    }

    #[must_use]
    pub const fn resource_kind(self) -> ResourceKind {
        match self {
            Self::InitContainers => ResourceKind::InitContainer,
            Self::Containers => ResourceKind::Container,
        }
    }
}

/// A compute resource value a pod may override on an injected container.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResourceOverride {
    CpuRequests,
    CpuLimits,
    MemoryRequests,
    MemoryLimits,
}

impl ResourceOverride {
    pub const ALL: [Self; 4] =
        [Self::CpuRequests, Self::CpuLimits, Self::MemoryRequests, Self::MemoryLimits];

    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::CpuRequests => "cpurequests",
            Self::CpuLimits => "cpulimits",
            Self::MemoryRequests => "memoryrequests",
            Self::MemoryLimits => "memorylimits",
        }
    }

    /// Key of the entry in the container's requests or limits map.
    #[must_use]
    pub const fn resource_name(self) -> &'static str {
        match self {
            Self::CpuRequests | Self::CpuLimits => "cpu",
            Self::MemoryRequests | Self::MemoryLimits => "memory",
        }
    }

    #[must_use]
    pub const fn is_limit(self) -> bool { matches!(self, Self::CpuLimits | Self::MemoryLimits) }

    /// Builds the annotation key, e.g.
    /// `sidecar-injector.ricoberger.de/containers-proxy-cpurequests`.
    #[must_use]
    pub fn annotation_key(self, phase: Phase, container_name: &str) -> String {
        format!("{}-{container_name}-{}", phase.annotation_key(), self.suffix())
    }
}

/// Splits a comma-separated annotation value into names, trimming whitespace
/// and dropping empty entries.
pub fn parse_name_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|name| !name.is_empty())
}

pub trait PodExt {
    fn annotation(&self, key: &str) -> Option<&str>;

    fn labels_or_empty(&self) -> BTreeMap<String, String>;

    fn is_injected(&self) -> bool;

    fn is_injection_enabled(&self) -> bool;

    fn requested_names(&self, kind: ResourceKind) -> Vec<String>;

    fn mark_injected(&mut self);

    fn display_name(&self) -> String;
}

impl PodExt for Pod {
    fn annotation(&self, key: &str) -> Option<&str> {
        self.metadata.annotations.as_ref()?.get(key).map(String::as_str)
    }

    fn labels_or_empty(&self) -> BTreeMap<String, String> {
        self.metadata.labels.clone().unwrap_or_default()
    }

    fn is_injected(&self) -> bool {
        self.annotation(annotations::STATUS.as_str()) == Some(annotations::STATUS_INJECTED)
    }

    fn is_injection_enabled(&self) -> bool {
        self.annotation(annotations::INJECT) == Some(annotations::INJECT_ENABLED)
    }

    fn requested_names(&self, kind: ResourceKind) -> Vec<String> {
        let key = match kind {
            ResourceKind::InitContainer => annotations::INIT_CONTAINERS.as_str(),
            ResourceKind::Container => annotations::CONTAINERS.as_str(),
            ResourceKind::Volume => annotations::VOLUMES.as_str(),
        };
        self.annotation(key)
            .map(|value| parse_name_list(value).map(ToString::to_string).collect())
            .unwrap_or_default()
    }

    fn mark_injected(&mut self) {
        let _previous = self
            .metadata
            .annotations
            .get_or_insert_with(BTreeMap::new)
            .insert(annotations::STATUS.to_string(), annotations::STATUS_INJECTED.to_string());
    }

    fn display_name(&self) -> String {
        self.metadata
            .name
            .clone()
            .or_else(|| self.metadata.generate_name.as_ref().map(|prefix| format!("{prefix}*")))
            .unwrap_or_default()
    }
}
