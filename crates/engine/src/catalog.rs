use std::collections::HashSet;

use k8s_openapi::{
    api::core::v1::{Container, Volume},
    apimachinery::pkg::apis::meta::v1::LabelSelector,
};
use kube::core::Selector;
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

use crate::error::{self, Error};

/// The deserializable form of a [`Catalog`], as it appears in the
/// configuration file.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDocument {
    #[serde(default)]
    pub containers: Vec<Container>,

    #[serde(default)]
    pub volumes: Vec<Volume>,

    #[serde(default)]
    pub environment_variables: Vec<EnvironmentBinding>,

    #[serde(default)]
    pub injectors: Vec<InjectorRule>,
}

/// Binds the value of a pod annotation to an environment variable of an
/// injected container.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct EnvironmentBinding {
    /// Name of the environment variable.
    pub name: String,

    /// Name of the catalog container receiving the variable.
    pub container: String,

    /// Annotation key supplying the value.
    pub annotation: String,
}

/// Injects the named resources into every pod whose labels match `selector`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectorRule {
    #[serde(default)]
    pub selector: LabelSelector,

    #[serde(default)]
    pub init_containers: Vec<String>,

    #[serde(default)]
    pub containers: Vec<String>,

    #[serde(default)]
    pub volumes: Vec<String>,
}

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum CatalogError {
    #[snafu(display("Container '{name}' is defined more than once in the catalog"))]
    DuplicateContainer { name: String },

    #[snafu(display("Volume '{name}' is defined more than once in the catalog"))]
    DuplicateVolume { name: String },
}

/// The read-only set of injectable resources and injector rules.
///
/// A `Catalog` cannot be modified once built. Templates are handed out as
/// owned copies so a request never alters the catalog.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    containers: Vec<Container>,
    volumes: Vec<Volume>,
    environment_bindings: Vec<EnvironmentBinding>,
    rules: Vec<InjectorRule>,
}

impl TryFrom<CatalogDocument> for Catalog {
    type Error = CatalogError;

    fn try_from(document: CatalogDocument) -> Result<Self, Self::Error> {
        let CatalogDocument { containers, volumes, environment_variables, injectors } = document;

        let mut seen = HashSet::new();
        if let Some(container) = containers.iter().find(|c| !seen.insert(c.name.as_str())) {
            return DuplicateContainerSnafu { name: container.name.clone() }.fail();
        }

        let mut seen = HashSet::new();
        if let Some(volume) = volumes.iter().find(|v| !seen.insert(v.name.as_str())) {
            return DuplicateVolumeSnafu { name: volume.name.clone() }.fail();
        }

        Ok(Self {
            containers,
            volumes,
            environment_bindings: environment_variables,
            rules: injectors,
        })
    }
}

impl Catalog {
    /// Returns a copy of the container template named `name`.
    #[must_use]
    pub fn container(&self, name: &str) -> Option<Container> {
        self.containers.iter().find(|container| container.name == name).cloned()
    }

    /// Returns a copy of the volume template named `name`.
    #[must_use]
    pub fn volume(&self, name: &str) -> Option<Volume> {
        self.volumes.iter().find(|volume| volume.name == name).cloned()
    }

    /// Environment bindings targeting `container_name`, in declaration order.
    pub fn environment_bindings_for<'a>(
        &'a self,
        container_name: &'a str,
    ) -> impl Iterator<Item = &'a EnvironmentBinding> {
        self.environment_bindings.iter().filter(move |binding| binding.container == container_name)
    }

    #[must_use]
    pub fn rules(&self) -> &[InjectorRule] { &self.rules }

    /// Converts every rule selector once, reporting the first malformed one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadConfiguration`] for the first rule whose selector
    /// cannot be converted.
    pub fn check_selectors(&self) -> Result<(), Error> {
        for (index, rule) in self.rules.iter().enumerate() {
            let _selector = Selector::try_from(rule.selector.clone())
                .context(error::BadConfigurationSnafu { index })?;
        }
        Ok(())
    }

    #[must_use]
    pub const fn summary(&self) -> (usize, usize, usize) {
        (self.containers.len(), self.volumes.len(), self.rules.len())
    }
}
