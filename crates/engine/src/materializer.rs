use std::{collections::BTreeMap, fmt};

use k8s_openapi::api::core::v1::{Container, EnvVar, Pod, ResourceRequirements, Volume};
use snafu::OptionExt;

use crate::{
    catalog::Catalog,
    error::{self, Error, ResourceKind},
    ext::{Phase, PodExt, ResourceOverride},
    quantity::{QuantityError, parse_quantity},
};

/// An override annotation whose value is not a valid quantity.
#[derive(Debug, PartialEq, Eq)]
pub struct RejectedOverride {
    pub key: String,
    pub value: String,
    pub source: QuantityError,
}

impl fmt::Display for RejectedOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ignoring override '{}={}': {}", self.key, self.value, self.source)
    }
}

/// Result of looking up one resource override annotation.
#[derive(Debug, PartialEq, Eq)]
pub enum OverrideOutcome {
    Applied,
    Absent,
    Rejected(RejectedOverride),
}

/// A container copied from the catalog with the pod's overrides applied.
#[derive(Debug)]
pub struct Materialized {
    pub container: Container,
    pub rejected_overrides: Vec<RejectedOverride>,
}

/// Produces request-local copies of catalog resources, customized by the
/// annotations of one pod.
#[derive(Clone, Copy, Debug)]
pub struct Materializer<'a> {
    catalog: &'a Catalog,
    pod: &'a Pod,
}

impl<'a> Materializer<'a> {
    #[must_use]
    pub const fn new(catalog: &'a Catalog, pod: &'a Pod) -> Self { Self { catalog, pod } }

    /// Copies the container template `name` and applies environment bindings
    /// and resource overrides for `phase`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceNotFound`] if the catalog has no container
    /// called `name`.
    pub fn container(&self, name: &str, phase: Phase) -> Result<Materialized, Error> {
        let mut container = self
            .catalog
            .container(name)
            .context(error::ResourceNotFoundSnafu { kind: phase.resource_kind(), name })?;

        self.inject_environment(&mut container);

        let rejected_overrides = ResourceOverride::ALL
            .into_iter()
            .filter_map(|kind| match self.apply_override(&mut container, phase, kind) {
                OverrideOutcome::Rejected(rejected) => Some(rejected),
                OverrideOutcome::Applied | OverrideOutcome::Absent => None,
            })
            .collect();

        Ok(Materialized { container, rejected_overrides })
    }

    /// Copies the volume template `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceNotFound`] if the catalog has no volume called
    /// `name`.
    pub fn volume(&self, name: &str) -> Result<Volume, Error> {
        self.catalog
            .volume(name)
            .context(error::ResourceNotFoundSnafu { kind: ResourceKind::Volume, name })
    }

    fn inject_environment(&self, container: &mut Container) {
        let variables = self
            .catalog
            .environment_bindings_for(&container.name)
            .filter_map(|binding| {
                let value = self.pod.annotation(&binding.annotation)?;
                (!value.is_empty()).then(|| EnvVar {
                    name: binding.name.clone(),
                    value: Some(value.to_string()),
                    value_from: None,
                })
            })
            .collect::<Vec<_>>();

        if !variables.is_empty() {
            container.env.get_or_insert_with(Vec::new).extend(variables);
        }
    }

    /// Applies the override annotation of `kind`, if present, to `container`.
    pub fn apply_override(
        &self,
        container: &mut Container,
        phase: Phase,
        kind: ResourceOverride,
    ) -> OverrideOutcome {
        let key = kind.annotation_key(phase, &container.name);
        let Some(value) = self.pod.annotation(&key).filter(|value| !value.is_empty()) else {
            return OverrideOutcome::Absent;
        };

        let quantity = match parse_quantity(value) {
            Ok(quantity) => quantity,
            Err(source) => {
                return OverrideOutcome::Rejected(RejectedOverride {
                    key,
                    value: value.to_string(),
                    source,
                });
            }
        };

        let resources = container.resources.get_or_insert_with(ResourceRequirements::default);
        let map = if kind.is_limit() { &mut resources.limits } else { &mut resources.requests };
        let _previous = map
            .get_or_insert_with(BTreeMap::new)
            .insert(kind.resource_name().to_string(), quantity);

        OverrideOutcome::Applied
    }
}
