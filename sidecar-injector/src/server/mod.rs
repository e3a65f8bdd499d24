mod admission;
mod error;
mod health;

use std::{net::SocketAddr, time::Duration};

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use sidecar_injector_engine::Injector;
use sigfinn::{ExitStatus, LifecycleManager};
use snafu::ResultExt;

pub use self::error::Error;
use crate::config::ServerConfig;

const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Serves the admission webhook over HTTPS and the health probes over plain
/// HTTP until a termination signal arrives.
pub struct Server {
    config: ServerConfig,
    injector: Injector,
}

impl Server {
    pub const fn new(config: ServerConfig, injector: Injector) -> Self { Self { config, injector } }

    pub async fn serve(self) -> Result<(), Error> {
        let Self { config, injector } = self;

        let tls_config = RustlsConfig::from_pem_file(config.cert_file_path(), config.key_file_path())
            .await
            .context(error::LoadTlsCertificateSnafu { cert_dir: config.cert_dir.clone() })?;

        let lifecycle_manager = LifecycleManager::<Error>::new();

        let webhook_address = config.listen_address;
        let _handle = lifecycle_manager.spawn("webhook", move |shutdown_signal| async move {
            let router = admission::router(injector);
            match serve_webhook(webhook_address, tls_config, router, shutdown_signal).await {
                Ok(()) => ExitStatus::Success,
                Err(err) => ExitStatus::Error(err),
            }
        });

        let health_address = config.health_address;
        let _handle = lifecycle_manager.spawn("health", move |shutdown_signal| async move {
            match serve_health(health_address, health::router(), shutdown_signal).await {
                Ok(()) => ExitStatus::Success,
                Err(err) => ExitStatus::Error(err),
            }
        });

        if let Ok(Err(err)) = lifecycle_manager.serve().await {
            tracing::error!("{err}");
            Err(err)
        } else {
            Ok(())
        }
    }
}

async fn serve_webhook(
    socket_address: SocketAddr,
    tls_config: RustlsConfig,
    router: Router,
    shutdown_signal: impl Future<Output = ()> + Send + Unpin + 'static,
) -> Result<(), Error> {
    let handle = axum_server::Handle::new();
    let _shutdown = tokio::spawn({
        let handle = handle.clone();
        async move {
            shutdown_signal.await;
            tracing::info!("Shutting down admission webhook");
            handle.graceful_shutdown(Some(GRACEFUL_SHUTDOWN_TIMEOUT));
        }
    });

    tracing::info!("Serving admission webhook on https://{socket_address}");

    axum_server::bind_rustls(socket_address, tls_config)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .context(error::ServeWebhookSnafu { socket_address })
}

async fn serve_health(
    socket_address: SocketAddr,
    router: Router,
    shutdown_signal: impl Future<Output = ()> + Send + Unpin + 'static,
) -> Result<(), Error> {
    let listener = tokio::net::TcpListener::bind(socket_address)
        .await
        .context(error::BindTcpSocketSnafu { socket_address })?;

    tracing::info!("Serving health checks on http://{socket_address}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .context(error::ServeHealthSnafu { socket_address })
}
