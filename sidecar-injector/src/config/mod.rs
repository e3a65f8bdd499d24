mod error;
mod server;

use std::path::{Path, PathBuf};

use resolve_path::PathResolveExt;
use serde::{Deserialize, Serialize};
use sidecar_injector_cli::config::LogConfig;
use sidecar_injector_engine::{Catalog, CatalogDocument};
use snafu::ResultExt;

pub use self::{error::Error, server::ServerConfig};

const TEMPLATE_BASIC: &[u8] = include_bytes!("default.yaml");

/// The configuration document: process settings plus the catalog of
/// injectable resources.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default = "LogConfig::default")]
    pub log: LogConfig,

    #[serde(flatten)]
    pub catalog: CatalogDocument,
}

impl Config {
    pub fn search_config_file_path() -> PathBuf {
        let paths = vec![Self::default_path()]
            .into_iter()
            .chain(sidecar_injector_base::fallback_project_config_directories().into_iter().map(
                |mut path| {
                    path.push(sidecar_injector_base::CLI_CONFIG_NAME);
                    path
                },
            ))
            .collect::<Vec<_>>();
        for path in paths {
            let Ok(exists) = path.try_exists() else {
                continue;
            };
            if exists {
                return path;
            }
        }
        PathBuf::from(sidecar_injector_base::CLI_CONFIG_NAME)
    }

    #[inline]
    pub fn default_path() -> PathBuf {
        [
            sidecar_injector_base::PROJECT_CONFIG_DIR.to_path_buf(),
            PathBuf::from(sidecar_injector_base::CLI_CONFIG_NAME),
        ]
        .into_iter()
        .collect()
    }

    #[inline]
    pub const fn template_basic() -> &'static [u8] { TEMPLATE_BASIC }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = resolve(path.as_ref())?;
        let data =
            std::fs::read(&path).context(error::OpenConfigSnafu { filename: path.clone() })?;
        let mut config = Self::from_slice(&data, path)?;

        config.log.file_path = config.log.file_path.as_deref().map(resolve).transpose()?;
        config.server.cert_dir = resolve(&config.server.cert_dir)?;

        Ok(config)
    }

    fn from_slice(data: &[u8], filename: PathBuf) -> Result<Self, Error> {
        serde_yaml::from_slice(data).context(error::ParseConfigSnafu { filename })
    }

    /// Builds the catalog described by this document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Catalog`] if a container or volume name is defined
    /// twice.
    pub fn catalog(&self) -> Result<Catalog, Error> {
        Catalog::try_from(self.catalog.clone()).context(error::CatalogSnafu)
    }
}

fn resolve(path: &Path) -> Result<PathBuf, Error> {
    path.try_resolve()
        .map(|resolved| resolved.to_path_buf())
        .with_context(|_| error::ResolveFilePathSnafu { file_path: path.to_path_buf() })
}
