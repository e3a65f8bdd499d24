use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};

/// Directory holding the serving certificate, relative to the working
/// directory unless configured otherwise.
pub const DEFAULT_CERT_DIR: &str = "cert";

pub const TLS_CERT_FILE_NAME: &str = "tls.crt";

pub const TLS_KEY_FILE_NAME: &str = "tls.key";

pub const DEFAULT_WEBHOOK_PORT: u16 = 8443;

pub const DEFAULT_HEALTH_PORT: u16 = 8080;

#[inline]
#[must_use]
pub fn default_cert_directory() -> PathBuf { PathBuf::from(DEFAULT_CERT_DIR) }

#[inline]
#[must_use]
pub const fn default_webhook_address() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_WEBHOOK_PORT)
}

#[inline]
#[must_use]
pub const fn default_health_address() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_HEALTH_PORT)
}
