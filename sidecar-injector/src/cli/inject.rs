use std::{io::Write, path::PathBuf};

use clap::{Args, ValueEnum};
use serde_json::Value;
use sidecar_injector_engine::{Injector, Outcome};
use snafu::ResultExt;

use crate::{
    cli::{Error, error},
    config::Config,
};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// RFC 6902 JSON patch against the input manifest.
    #[default]
    Patch,
    /// The mutated pod.
    Object,
}

#[derive(Args, Clone, Debug)]
pub struct InjectCommand {
    #[arg(help = "Pod manifest to inject into, in YAML or JSON")]
    file: PathBuf,

    #[arg(long = "output", short = 'o', value_enum, default_value_t, help = "What to print")]
    output: OutputFormat,
}

impl InjectCommand {
    pub fn run(self, config: &Config) -> Result<(), Error> {
        let data = std::fs::read(&self.file)
            .context(error::ReadManifestSnafu { file_path: self.file.clone() })?;
        let original: Value = serde_yaml::from_slice(&data)
            .context(error::ParseManifestSnafu { file_path: self.file.clone() })?;

        let rendered = render(&Injector::new(config.catalog()?), &original, self.output)?;

        writeln!(std::io::stdout(), "{rendered}").context(error::WriteStdoutSnafu)
    }
}

fn render(injector: &Injector, original: &Value, output: OutputFormat) -> Result<String, Error> {
    match (injector.inject(original)?, output) {
        (Outcome::Injected(injection), OutputFormat::Patch) => {
            serde_json::to_string_pretty(&injection.patch)
        }
        (Outcome::Injected(injection), OutputFormat::Object) => {
            serde_json::to_string_pretty(&injection.object)
        }
        (Outcome::AlreadyInjected | Outcome::NotRequested, OutputFormat::Patch) => {
            serde_json::to_string_pretty(&json_patch::Patch(Vec::new()))
        }
        (Outcome::AlreadyInjected | Outcome::NotRequested, OutputFormat::Object) => {
            serde_json::to_string_pretty(original)
        }
    }
    .context(error::SerializeOutputSnafu)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use k8s_openapi::api::core::v1::Pod;
    use sidecar_injector_engine::{Catalog, PodExt};

    use super::*;

    const MANIFEST: &str = r"
apiVersion: v1
kind: Pod
metadata:
  name: web-0
  labels:
    sidecar-injector.ricoberger.de/mesh: enabled
spec:
  containers:
    - name: app
      image: nginx
";

    fn injector() -> Injector {
        let config: Config = serde_yaml::from_slice(Config::template_basic()).unwrap();
        Injector::new(config.catalog().unwrap())
    }

    #[test]
    fn test_render_object() {
        let original: Value = serde_yaml::from_str(MANIFEST).unwrap();

        let rendered = render(&injector(), &original, OutputFormat::Object).unwrap();

        let pod: Pod = serde_json::from_str(&rendered).unwrap();
        assert!(pod.is_injected());
        let spec = pod.spec.unwrap();
        assert_eq!(spec.containers.len(), 2);
        assert_eq!(spec.init_containers.unwrap()[0].name, "wait-for-network");
    }

    #[test]
    fn test_render_patch_applies_to_manifest() {
        let original: Value = serde_yaml::from_str(MANIFEST).unwrap();

        let rendered = render(&injector(), &original, OutputFormat::Patch).unwrap();

        let patch: json_patch::Patch = serde_json::from_str(&rendered).unwrap();
        let mut patched = original;
        json_patch::patch(&mut patched, &patch).unwrap();
        assert_eq!(patched["spec"]["containers"][1]["name"], "envoy");
    }

    #[test]
    fn test_render_skipped_pod_is_empty_patch() {
        let original: Value = serde_yaml::from_str(
            "apiVersion: v1\nkind: Pod\nmetadata:\n  name: db-0\nspec:\n  containers: []\n",
        )
        .unwrap();

        let rendered = render(&Injector::new(Catalog::default()), &original, OutputFormat::Patch)
            .unwrap();

        assert_eq!(rendered, "[]");
    }

    #[test]
    fn test_missing_manifest() {
        let command = InjectCommand {
            file: Path::new("/nonexistent/pod.yaml").to_path_buf(),
            output: OutputFormat::Patch,
        };

        assert!(matches!(command.run(&Config::default()), Err(Error::ReadManifest { .. })));
    }
}
