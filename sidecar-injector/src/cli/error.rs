use std::path::PathBuf;

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("{source}"))]
    Configuration { source: crate::config::Error },

    #[snafu(display("{source}"))]
    Server { source: crate::server::Error },

    #[snafu(display("{source}"))]
    Injection { source: sidecar_injector_engine::Error },

    #[snafu(display("Failed to read manifest {}, error: {source}", file_path.display()))]
    ReadManifest { file_path: PathBuf, source: std::io::Error },

    #[snafu(display("Failed to parse manifest {}, error: {source}", file_path.display()))]
    ParseManifest { file_path: PathBuf, source: serde_yaml::Error },

    #[snafu(display("Failed to serialize output, error: {source}"))]
    SerializeOutput { source: serde_json::Error },

    #[snafu(display("Failed to write to stdout, error: {source}"))]
    WriteStdout { source: std::io::Error },

    #[snafu(display("Failed to create tokio runtime, error: {source}"))]
    InitializeTokioRuntime { source: std::io::Error },
}

impl From<crate::config::Error> for Error {
    fn from(source: crate::config::Error) -> Self { Self::Configuration { source } }
}

impl From<crate::server::Error> for Error {
    fn from(source: crate::server::Error) -> Self { Self::Server { source } }
}

impl From<sidecar_injector_engine::Error> for Error {
    fn from(source: sidecar_injector_engine::Error) -> Self { Self::Injection { source } }
}
