use std::{net::SocketAddr, path::PathBuf};

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display(
        "Failed to load TLS certificate and key from {}, error: {source}",
        cert_dir.display()
    ))]
    LoadTlsCertificate { cert_dir: PathBuf, source: std::io::Error },

    #[snafu(display("Failed to bind TCP socket {socket_address}, error: {source}"))]
    BindTcpSocket { socket_address: SocketAddr, source: std::io::Error },

    #[snafu(display("Error occurs while serving webhook on {socket_address}, error: {source}"))]
    ServeWebhook { socket_address: SocketAddr, source: std::io::Error },

    #[snafu(display("Error occurs while serving health checks on {socket_address}, error: {source}"))]
    ServeHealth { socket_address: SocketAddr, source: std::io::Error },
}
