use std::sync::Arc;

use k8s_openapi::api::core::v1::Pod;
use serde_json::Value;
use snafu::ResultExt;

use crate::{
    catalog::Catalog,
    directive::{self, SkipReason},
    error::{self, Error},
    ext::PodExt,
    patch::{self, Injection},
};

/// Result of a successful injection attempt.
#[derive(Debug)]
pub enum Outcome {
    AlreadyInjected,
    NotRequested,
    Injected(Box<Injection>),
}

/// What a transport should answer for one admission request.
#[derive(Debug)]
pub enum Decision {
    /// Admit the pod unchanged.
    Allow { reason: SkipReason },
    /// Admit the pod with `patch` applied.
    Patch { patch: json_patch::Patch },
    /// Deny the request.
    Reject { status: u16, message: String },
}

impl From<Result<Outcome, Error>> for Decision {
    fn from(result: Result<Outcome, Error>) -> Self {
        match result {
            Ok(Outcome::AlreadyInjected) => Self::Allow { reason: SkipReason::AlreadyInjected },
            Ok(Outcome::NotRequested) => Self::Allow { reason: SkipReason::NotRequested },
            Ok(Outcome::Injected(injection)) => Self::Patch { patch: injection.patch },
            Err(err) => Self::Reject { status: err.status_code(), message: err.to_string() },
        }
    }
}

/// Decides and performs sidecar injection for pods.
///
/// Cloning an `Injector` is cheap; clones share the same catalog.
#[derive(Clone, Debug)]
pub struct Injector {
    catalog: Arc<Catalog>,
}

impl Injector {
    #[must_use]
    pub fn new(catalog: Catalog) -> Self { Self { catalog: Arc::new(catalog) } }

    /// Decides on a raw JSON pod payload.
    #[must_use]
    pub fn decide(&self, raw: &[u8]) -> Decision {
        match serde_json::from_slice::<Value>(raw).context(error::BadRequestSnafu) {
            Ok(original) => self.decide_value(original),
            Err(err) => {
                tracing::warn!("Could not decode request: {err}");
                Decision::from(Err(err))
            }
        }
    }

    /// Decides on a pod payload that is already parsed.
    #[must_use]
    pub fn decide_value(&self, original: Value) -> Decision {
        Decision::from(self.inject(&original))
    }

    /// Injects the resources `original` asks for.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the payload is not a pod, when a rule
    /// selector is malformed, when a requested resource is not in the
    /// catalog, or when the mutated pod cannot be serialized. No partial
    /// injection is ever produced.
    pub fn inject(&self, original: &Value) -> Result<Outcome, Error> {
        let pod: Pod = serde_json::from_value(original.clone())
            .context(error::BadRequestSnafu)
            .inspect_err(|err| tracing::warn!("Could not decode request: {err}"))?;
        let name = pod.display_name();
        let namespace = pod.metadata.namespace.clone().unwrap_or_default();

        let directive = directive::resolve(&pod, &self.catalog).inspect_err(|err| {
            tracing::error!(
                pod.name = %name,
                pod.namespace = %namespace,
                "Failed to resolve injection directive: {err}"
            );
        })?;

        if let Some(reason) = directive.skip_reason {
            tracing::debug!(pod.name = %name, pod.namespace = %namespace, "Skip pod, {reason}");
            return Ok(match reason {
                SkipReason::AlreadyInjected => Outcome::AlreadyInjected,
                SkipReason::NotRequested => Outcome::NotRequested,
            });
        }

        let injection =
            patch::emit_patch(pod, &directive, &self.catalog).inspect_err(|err| {
                tracing::warn!(pod.name = %name, pod.namespace = %namespace, "Reject pod: {err}");
            })?;

        for rejected in &injection.rejected_overrides {
            tracing::warn!(pod.name = %name, pod.namespace = %namespace, "{rejected}");
        }

        tracing::info!(
            pod.name = %name,
            pod.namespace = %namespace,
            init_containers = ?directive.init_containers,
            containers = ?directive.containers,
            volumes = ?directive.volumes,
            "Inject sidecars"
        );

        Ok(Outcome::Injected(Box::new(injection)))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use k8s_openapi::{
        api::core::v1::{Container, ResourceRequirements, Volume},
        apimachinery::pkg::{
            api::resource::Quantity,
            apis::meta::v1::{LabelSelector, LabelSelectorRequirement},
        },
    };
    use serde_json::json;

    use super::*;
    use crate::catalog::{CatalogDocument, InjectorRule};

    fn injector() -> Injector {
        let document = CatalogDocument {
            containers: vec![
                Container {
                    name: "sidecar".to_string(),
                    image: Some("sidecar:1.0".to_string()),
                    resources: Some(ResourceRequirements {
                        requests: Some(BTreeMap::from([(
                            "cpu".to_string(),
                            Quantity("100m".to_string()),
                        )])),
                        ..ResourceRequirements::default()
                    }),
                    ..Container::default()
                },
                Container { name: "proxy".to_string(), ..Container::default() },
                Container { name: "agent".to_string(), ..Container::default() },
            ],
            volumes: vec![Volume { name: "shared".to_string(), ..Volume::default() }],
            injectors: vec![InjectorRule {
                selector: LabelSelector {
                    match_labels: Some(BTreeMap::from([(
                        "mesh".to_string(),
                        "enabled".to_string(),
                    )])),
                    ..LabelSelector::default()
                },
                containers: vec!["proxy".to_string()],
                ..InjectorRule::default()
            }],
            ..CatalogDocument::default()
        };
        Injector::new(Catalog::try_from(document).unwrap())
    }

    fn pod(labels: &Value, annotations: &Value) -> Value {
        json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {
                "name": "web-0",
                "namespace": "default",
                "labels": labels,
                "annotations": annotations,
            },
            "spec": { "containers": [{ "name": "app", "image": "nginx" }] }
        })
    }

    fn injected(outcome: Result<Outcome, Error>) -> Injection {
        match outcome.unwrap() {
            Outcome::Injected(injection) => *injection,
            other => panic!("expected an injection, got {other:?}"),
        }
    }

    fn container_names(pod: &Pod) -> Vec<&str> {
        pod.spec.as_ref().unwrap().containers.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_sidecar_cpu_request_override() {
        let original = pod(
            &json!({}),
            &json!({
                "sidecar-injector.ricoberger.de": "enabled",
                "sidecar-injector.ricoberger.de/containers": "sidecar",
                "sidecar-injector.ricoberger.de/containers-sidecar-cpurequests": "250m",
            }),
        );

        let injection = injected(injector().inject(&original));

        let sidecar = &injection.object.spec.as_ref().unwrap().containers[1];
        assert_eq!(sidecar.name, "sidecar");
        let requests = sidecar.resources.as_ref().unwrap().requests.as_ref().unwrap();
        assert_eq!(requests["cpu"], Quantity("250m".to_string()));
        assert!(injection.object.is_injected());
    }

    #[test]
    fn test_second_pass_is_a_no_op() {
        let injector = injector();
        let original = pod(
            &json!({ "mesh": "enabled" }),
            &json!({ "sidecar-injector.ricoberger.de/volumes": "shared" }),
        );

        let injection = injected(injector.inject(&original));
        let mutated = serde_json::to_value(&injection.object).unwrap();

        assert!(matches!(
            injector.decide_value(mutated),
            Decision::Allow { reason: SkipReason::AlreadyInjected }
        ));
    }

    #[test]
    fn test_rule_and_annotation_resources_are_combined() {
        let original = pod(
            &json!({ "mesh": "enabled" }),
            &json!({ "sidecar-injector.ricoberger.de/containers": "agent,proxy" }),
        );

        let injection = injected(injector().inject(&original));

        assert_eq!(container_names(&injection.object), vec!["app", "proxy", "agent"]);
    }

    #[test]
    fn test_invalid_override_is_ignored() {
        let original = pod(
            &json!({}),
            &json!({
                "sidecar-injector.ricoberger.de": "enabled",
                "sidecar-injector.ricoberger.de/containers": "sidecar",
                "sidecar-injector.ricoberger.de/containers-sidecar-cpurequests": "a lot",
            }),
        );

        let injection = injected(injector().inject(&original));

        let sidecar = &injection.object.spec.as_ref().unwrap().containers[1];
        let requests = sidecar.resources.as_ref().unwrap().requests.as_ref().unwrap();
        assert_eq!(requests["cpu"], Quantity("100m".to_string()));
        assert_eq!(injection.rejected_overrides.len(), 1);
    }

    #[test]
    fn test_missing_resource_rejects_without_patch() {
        let original = pod(
            &json!({ "mesh": "enabled" }),
            &json!({ "sidecar-injector.ricoberger.de/containers": "sidecar,agent,ghost" }),
        );

        match injector().decide_value(original) {
            Decision::Reject { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "The container 'ghost' was not found in the catalog");
            }
            other => panic!("expected a rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_unrequested_pod_is_allowed_unchanged() {
        let original = pod(&json!({ "app": "web" }), &json!({}));

        assert!(matches!(
            injector().inject(&original),
            Ok(Outcome::NotRequested)
        ));
    }

    #[test]
    fn test_duplicate_names_are_injected_once() {
        let original = pod(
            &json!({ "mesh": "enabled" }),
            &json!({ "sidecar-injector.ricoberger.de/containers": " proxy , agent, agent" }),
        );

        let injection = injected(injector().inject(&original));

        assert_eq!(container_names(&injection.object), vec!["app", "proxy", "agent"]);
    }

    #[test]
    fn test_decide_rejects_undecodable_payload() {
        assert!(matches!(
            injector().decide(b"{ not json"),
            Decision::Reject { status: 400, .. }
        ));
        assert!(matches!(
            injector().decide(br#"{"spec": {"containers": "app"}}"#),
            Decision::Reject { status: 400, .. }
        ));
    }

    #[test]
    fn test_decide_returns_patch() {
        let raw = serde_json::to_vec(&pod(&json!({ "mesh": "enabled" }), &json!({}))).unwrap();

        let Decision::Patch { patch } = injector().decide(&raw) else {
            panic!("expected a patch");
        };

        let mut patched = serde_json::from_slice::<Value>(&raw).unwrap();
        json_patch::patch(&mut patched, &patch).unwrap();
        let pod: Pod = serde_json::from_value(patched).unwrap();
        assert_eq!(container_names(&pod), vec!["app", "proxy"]);
        assert!(pod.is_injected());
    }

    #[test]
    fn test_decide_value_rejects_undecodable_pod() {
        let original = json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": { "name": "web-0", "labels": { "mesh": "enabled" } },
            "spec": { "containers": [{ "name": 7 }] }
        });

        assert!(matches!(
            injector().decide_value(original),
            Decision::Reject { status: 400, .. }
        ));
    }

    #[test]
    fn test_patch_keeps_explicit_nulls_of_payload() {
        let mut original = pod(&json!({ "mesh": "enabled" }), &json!({}));
        original["metadata"]["creationTimestamp"] = Value::Null;
        let raw = serde_json::to_vec(&original).unwrap();

        let Decision::Patch { patch } = injector().decide(&raw) else {
            panic!("expected a patch");
        };

        assert!(
            !patch.0.iter().any(|op| matches!(op, json_patch::PatchOperation::Remove(_))),
            "unexpected remove in {patch:?}"
        );
        let mut patched = original;
        json_patch::patch(&mut patched, &patch).unwrap();
        assert_eq!(patched["metadata"]["creationTimestamp"], Value::Null);
        let pod: Pod = serde_json::from_value(patched).unwrap();
        assert_eq!(container_names(&pod), vec!["app", "proxy"]);
        assert!(pod.is_injected());
    }

    #[test]
    fn test_malformed_selector_is_a_server_error() {
        let document = CatalogDocument {
            injectors: vec![InjectorRule {
                selector: LabelSelector {
                    match_expressions: Some(vec![LabelSelectorRequirement {
                        key: "env".to_string(),
                        operator: "Matches".to_string(),
                        values: Some(vec!["prod".to_string()]),
                    }]),
                    ..LabelSelector::default()
                },
                ..InjectorRule::default()
            }],
            ..CatalogDocument::default()
        };
        let injector = Injector::new(Catalog::try_from(document).unwrap());

        assert!(matches!(
            injector.decide_value(pod(&json!({}), &json!({}))),
            Decision::Reject { status: 500, .. }
        ));
    }
}
