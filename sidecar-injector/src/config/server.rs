use std::{net::SocketAddr, path::PathBuf};

use serde::{Deserialize, Serialize};
use sidecar_injector_base::config::{
    TLS_CERT_FILE_NAME, TLS_KEY_FILE_NAME, default_cert_directory, default_health_address,
    default_webhook_address,
};

/// Listener settings of the admission server.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Address of the HTTPS webhook listener.
    #[serde(default = "default_webhook_address")]
    pub listen_address: SocketAddr,

    /// Address of the plain HTTP health listener.
    #[serde(default = "default_health_address")]
    pub health_address: SocketAddr,

    /// Directory containing `tls.crt` and `tls.key`.
    #[serde(default = "default_cert_directory")]
    pub cert_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: default_webhook_address(),
            health_address: default_health_address(),
            cert_dir: default_cert_directory(),
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn cert_file_path(&self) -> PathBuf { self.cert_dir.join(TLS_CERT_FILE_NAME) }

    #[must_use]
    pub fn key_file_path(&self) -> PathBuf { self.cert_dir.join(TLS_KEY_FILE_NAME) }
}
