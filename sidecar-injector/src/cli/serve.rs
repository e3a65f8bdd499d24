use std::{net::SocketAddr, path::PathBuf};

use clap::Args;
use sidecar_injector_engine::Injector;
use snafu::ResultExt;
use tokio::runtime::Runtime;

use crate::{
    cli::{Error, error},
    config::Config,
    server::Server,
    shadow,
};

#[derive(Args, Clone, Debug, Default)]
pub struct ServeCommand {
    #[arg(
        long = "cert-dir",
        env = "SIDECAR_INJECTOR_CERT_DIR",
        help = "Directory containing tls.crt and tls.key"
    )]
    cert_dir: Option<PathBuf>,

    #[arg(
        long = "listen-address",
        env = "SIDECAR_INJECTOR_LISTEN_ADDRESS",
        help = "Address of the HTTPS admission webhook listener"
    )]
    listen_address: Option<SocketAddr>,

    #[arg(
        long = "health-address",
        env = "SIDECAR_INJECTOR_HEALTH_ADDRESS",
        help = "Address of the plain HTTP health probe listener"
    )]
    health_address: Option<SocketAddr>,
}

impl ServeCommand {
    pub fn run(self, mut config: Config) -> Result<(), Error> {
        let Self { cert_dir, listen_address, health_address } = self;
        if let Some(cert_dir) = cert_dir {
            config.server.cert_dir = cert_dir;
        }
        if let Some(listen_address) = listen_address {
            config.server.listen_address = listen_address;
        }
        if let Some(health_address) = health_address {
            config.server.health_address = health_address;
        }

        tracing::info!("Starting {}", sidecar_injector_base::PROJECT_NAME_WITH_INITIAL_CAPITAL);
        tracing::info!(
            version = shadow::PKG_VERSION,
            branch = shadow::BRANCH,
            revision = shadow::SHORT_COMMIT,
            "Version information"
        );
        tracing::info!(
            build_time = shadow::BUILD_TIME,
            rust_version = shadow::RUST_VERSION,
            build_os = shadow::BUILD_OS,
            "Build context"
        );

        let catalog = config.catalog()?;
        catalog.check_selectors()?;
        let (containers, volumes, injectors) = catalog.summary();
        tracing::info!(containers, volumes, injectors, "Catalog loaded");

        if rustls::crypto::aws_lc_rs::default_provider().install_default().is_err() {
            tracing::debug!("A rustls crypto provider is already installed");
        }

        let server = Server::new(config.server, Injector::new(catalog));
        Runtime::new().context(error::InitializeTokioRuntimeSnafu)?.block_on(server.serve())?;

        tracing::info!("Admission server stopped");
        Ok(())
    }
}
