//! Process-level plumbing shared by the `sidecar-injector` binaries.

pub mod config;
