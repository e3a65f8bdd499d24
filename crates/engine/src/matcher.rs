use std::collections::BTreeMap;

use kube::core::{Selector, SelectorExt};
use snafu::ResultExt;

use crate::{
    catalog::InjectorRule,
    error::{self, Error},
};

/// Resource names contributed by the last injector rule matching a pod.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MatchedResources {
    pub init_containers: Vec<String>,
    pub containers: Vec<String>,
    pub volumes: Vec<String>,
}

impl MatchedResources {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.init_containers.is_empty() && self.containers.is_empty() && self.volumes.is_empty()
    }
}

/// Evaluates `rules` in order against `labels`.
///
/// A matching rule replaces whatever an earlier rule contributed, so the last
/// match wins.
///
/// # Errors
///
/// Returns [`Error::BadConfiguration`] when a rule's selector cannot be
/// converted, regardless of whether a later rule would have matched.
pub fn match_rules(
    rules: &[InjectorRule],
    labels: &BTreeMap<String, String>,
) -> Result<MatchedResources, Error> {
    let mut matched = MatchedResources::default();

    for (index, rule) in rules.iter().enumerate() {
        let selector = Selector::try_from(rule.selector.clone())
            .context(error::BadConfigurationSnafu { index })?;

        if selector.matches(labels) {
            matched = MatchedResources {
                init_containers: rule.init_containers.clone(),
                containers: rule.containers.clone(),
                volumes: rule.volumes.clone(),
            };
        }
    }

    Ok(matched)
}
