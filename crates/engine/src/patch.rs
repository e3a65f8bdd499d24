use k8s_openapi::api::core::v1::{Container, Pod, PodSpec, Volume};
use snafu::ResultExt;

use crate::{
    catalog::Catalog,
    directive::InjectionDirective,
    error::{self, Error},
    ext::{Phase, PodExt},
    materializer::{Materialized, Materializer, RejectedOverride},
};

/// Every resource of a directive, materialized up front so a missing name is
/// detected before the pod is touched.
#[derive(Debug, Default)]
pub struct InjectionPlan {
    init_containers: Vec<Container>,
    containers: Vec<Container>,
    volumes: Vec<Volume>,
    rejected_overrides: Vec<RejectedOverride>,
}

impl InjectionPlan {
    /// Materializes every name of `directive` in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceNotFound`] for the first name the catalog
    /// does not define.
    pub fn build(
        directive: &InjectionDirective,
        materializer: &Materializer<'_>,
    ) -> Result<Self, Error> {
        let mut plan = Self::default();

        for (names, phase) in [
            (&directive.init_containers, Phase::InitContainers),
            (&directive.containers, Phase::Containers),
        ] {
            for name in names {
                let Materialized { container, rejected_overrides } =
                    materializer.container(name, phase)?;
                plan.rejected_overrides.extend(rejected_overrides);
                match phase {
                    Phase::InitContainers => plan.init_containers.push(container),
                    Phase::Containers => plan.containers.push(container),
                }
            }
        }

        plan.volumes = directive
            .volumes
            .iter()
            .map(|name| materializer.volume(name))
            .collect::<Result<_, _>>()?;

        Ok(plan)
    }

    /// Appends the planned resources to `pod` and stamps the status
    /// annotation.
    pub fn apply(self, pod: &mut Pod) -> Vec<RejectedOverride> {
        let Self { init_containers, containers, volumes, rejected_overrides } = self;

        let spec = pod.spec.get_or_insert_with(PodSpec::default);
        if !init_containers.is_empty() {
            spec.init_containers.get_or_insert_with(Vec::new).extend(init_containers);
        }
        spec.containers.extend(containers);
        if !volumes.is_empty() {
            spec.volumes.get_or_insert_with(Vec::new).extend(volumes);
        }

        pod.mark_injected();

        rejected_overrides
    }
}

/// A completed injection.
#[derive(Debug)]
pub struct Injection {
    /// The mutated pod.
    pub object: Pod,

    /// RFC 6902 patch turning the decoded pod into `object`.
    pub patch: json_patch::Patch,

    /// Override annotations that were ignored.
    pub rejected_overrides: Vec<RejectedOverride>,
}

/// Applies `directive` to `pod` and diffs the result against `pod` as it
/// serializes before the mutation.
///
/// The patch only adds. Explicit nulls and unknown keys of the raw payload
/// are left alone.
///
/// # Errors
///
/// Returns [`Error::ResourceNotFound`] when a name of the directive is
/// missing from the catalog, in which case `pod` is left untouched, or
/// [`Error::Serialization`] when the pod cannot be serialized.
pub fn emit_patch(
    mut pod: Pod,
    directive: &InjectionDirective,
    catalog: &Catalog,
) -> Result<Injection, Error> {
    let plan = InjectionPlan::build(directive, &Materializer::new(catalog, &pod))?;
    let baseline = serde_json::to_value(&pod).context(error::SerializationSnafu)?;
    let rejected_overrides = plan.apply(&mut pod);

    let mutated = serde_json::to_value(&pod).context(error::SerializationSnafu)?;
    let patch = json_patch::diff(&baseline, &mutated);

    Ok(Injection { object: pod, patch, rejected_overrides })
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::{catalog::CatalogDocument, error::ResourceKind};

    fn catalog() -> Catalog {
        Catalog::try_from(CatalogDocument {
            containers: vec![
                Container { name: "proxy".to_string(), ..Container::default() },
                Container { name: "setup".to_string(), ..Container::default() },
            ],
            volumes: vec![Volume { name: "certs".to_string(), ..Volume::default() }],
            ..CatalogDocument::default()
        })
        .unwrap()
    }

    fn directive(init: &[&str], containers: &[&str], volumes: &[&str]) -> InjectionDirective {
        let owned = |names: &[&str]| names.iter().map(ToString::to_string).collect();
        InjectionDirective {
            init_containers: owned(init),
            containers: owned(containers),
            volumes: owned(volumes),
            skip_reason: None,
        }
    }

    fn original() -> Value {
        json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": { "name": "web-0" },
            "spec": { "containers": [{ "name": "app", "image": "nginx" }] }
        })
    }

    #[test]
    fn test_apply_order_and_status() {
        let original = original();
        let pod: Pod = serde_json::from_value(original.clone()).unwrap();

        let injection =
            emit_patch(pod, &directive(&["setup"], &["proxy"], &["certs"]), &catalog()).unwrap();

        let spec = injection.object.spec.as_ref().unwrap();
        let names = spec.containers.iter().map(|c| c.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["app", "proxy"]);
        assert_eq!(spec.init_containers.as_ref().unwrap()[0].name, "setup");
        assert_eq!(spec.volumes.as_ref().unwrap()[0].name, "certs");
        assert!(injection.object.is_injected());

        let mut patched = original;
        json_patch::patch(&mut patched, &injection.patch).unwrap();
        assert_eq!(patched, serde_json::to_value(&injection.object).unwrap());
    }

    #[test]
    fn test_missing_name_leaves_pod_untouched() {
        let original = original();
        let pod: Pod = serde_json::from_value(original).unwrap();
        let directive = directive(&["setup"], &["proxy", "ghost"], &["certs"]);

        let result = InjectionPlan::build(&directive, &Materializer::new(&catalog(), &pod));

        assert!(matches!(
            result,
            Err(Error::ResourceNotFound { kind: ResourceKind::Container, ref name }) if name == "ghost"
        ));
        assert_eq!(pod.spec.as_ref().unwrap().containers.len(), 1);
        assert!(pod.spec.as_ref().unwrap().init_containers.is_none());
        assert!(!pod.is_injected());
    }

    #[test]
    fn test_pod_without_spec_or_annotations() {
        let injection =
            emit_patch(Pod::default(), &directive(&[], &["proxy"], &[]), &catalog()).unwrap();

        assert_eq!(injection.object.spec.unwrap().containers[0].name, "proxy");
        assert!(!injection.patch.0.is_empty());
    }
}
