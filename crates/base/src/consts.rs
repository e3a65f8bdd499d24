pub mod k8s {
    pub mod annotations {
        //! Pod annotations understood by the injector.

        use std::sync::LazyLock;

        /// Domain shared by every injector annotation. The bare domain is
        /// also the key of the injection gate.
        pub const DOMAIN: &str = "sidecar-injector.ricoberger.de";

        /// Setting this annotation to [`INJECT_ENABLED`] requests injection.
        pub const INJECT: &str = DOMAIN;

        pub const INJECT_ENABLED: &str = "enabled";

        /// Comma-separated names of catalog containers to inject.
        pub static CONTAINERS: LazyLock<String> =
            LazyLock::new(|| format!("{DOMAIN}/containers"));

        /// Comma-separated names of catalog containers to inject as init
        /// containers.
        pub static INIT_CONTAINERS: LazyLock<String> =
            LazyLock::new(|| format!("{DOMAIN}/init-containers"));

        /// Comma-separated names of catalog volumes to inject.
        pub static VOLUMES: LazyLock<String> = LazyLock::new(|| format!("{DOMAIN}/volumes"));

        /// Marker written after a successful injection.
        pub static STATUS: LazyLock<String> = LazyLock::new(|| format!("{DOMAIN}/status"));

        pub const STATUS_INJECTED: &str = "injected";
    }
}
