use std::path::PathBuf;

use snafu::Snafu;

/// Errors raised while loading the configuration document.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// The configuration file at `filename` cannot be read.
    #[snafu(display("Failed to open config from {}, error: {source}", filename.display()))]
    OpenConfig { filename: PathBuf, source: std::io::Error },

    /// The content of `filename` is not a valid configuration document.
    #[snafu(display("Failed to parse config from {}, error: {source}", filename.display()))]
    ParseConfig { filename: PathBuf, source: serde_yaml::Error },

    /// A path in the configuration cannot be resolved, for instance because
    /// the home directory is unknown.
    #[snafu(display("Failed to resolve file path {}, error: {source}", file_path.display()))]
    ResolveFilePath { file_path: PathBuf, source: std::io::Error },

    /// The catalog section of the document is inconsistent.
    #[snafu(display("Invalid catalog, error: {source}"))]
    Catalog { source: sidecar_injector_engine::CatalogError },
}
