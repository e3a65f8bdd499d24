//! Command line interface of the sidecar injector.
//!
//! # Examples
//!
//! ```bash
//! # Run the admission webhook
//! sidecar-injector serve --cert-dir /etc/webhook/certs
//!
//! # Show the patch the webhook would answer for a manifest
//! sidecar-injector inject pod.yaml
//!
//! # Check a configuration file
//! sidecar-injector --config config.yaml validate
//! ```

pub mod error;
mod inject;
mod serve;
mod validate;

use std::{io::Write, path::PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use sidecar_injector_base::CLI_PROGRAM_NAME;
use sidecar_injector_cli::config::LogFormat;
use snafu::ResultExt;

pub use self::error::Error;
use self::{inject::InjectCommand, serve::ServeCommand};
use crate::{config::Config, shadow};

#[derive(Parser)]
#[command(
    name = CLI_PROGRAM_NAME,
    author,
    version,
    long_version = shadow::CLAP_LONG_VERSION,
    about = "Sidecar Injector: a Kubernetes mutating admission webhook that injects sidecars.",
    long_about = "Sidecar Injector adds containers, init containers, volumes and environment \
                  variables to pods at admission time. What is injected is driven by label \
                  selector rules in the configuration and by annotations on each pod.",
    color = clap::ColorChoice::Always
)]
pub struct Cli {
    #[clap(subcommand)]
    commands: Option<Commands>,

    #[clap(
        long = "config",
        short = 'c',
        env = "SIDECAR_INJECTOR_CONFIG_FILE_PATH",
        help = "Specify a configuration file. Defaults to ~/.config/sidecar-injector/config.yaml \
                or SIDECAR_INJECTOR_CONFIG_FILE_PATH env var."
    )]
    config_file: Option<PathBuf>,

    #[clap(
        long = "log-level",
        env = "SIDECAR_INJECTOR_LOG_LEVEL",
        help = "Set the logging level (e.g., info, debug, trace)."
    )]
    log_level: Option<tracing::Level>,

    #[clap(
        long = "log-format",
        env = "SIDECAR_INJECTOR_LOG_FORMAT",
        help = "Set the log output format (console or json)."
    )]
    log_format: Option<LogFormat>,
}

#[derive(Clone, Subcommand)]
pub enum Commands {
    #[command(about = "Print version and build information")]
    Version,

    #[command(about = "Generate shell completion script for the specified shell (bash, zsh, fish)")]
    Completions { shell: clap_complete::Shell },

    #[command(about = "Output the default configuration in YAML format")]
    DefaultConfig,

    #[command(about = "Run the admission webhook server (default)")]
    Serve(ServeCommand),

    #[command(about = "Run the injection engine against a pod manifest and print the result")]
    Inject(InjectCommand),

    #[command(about = "Check the configuration file and its injector rules")]
    Validate,
}

impl Default for Cli {
    fn default() -> Self { Self::parse() }
}

impl Cli {
    fn load_config(&self) -> Result<Config, Error> {
        let mut config =
            Config::load(self.config_file.clone().unwrap_or_else(Config::search_config_file_path))?;

        if let Some(log_level) = self.log_level {
            config.log.level = log_level;
        }
        if let Some(log_format) = self.log_format {
            config.log.format = log_format;
        }

        Ok(config)
    }

    pub fn run(self) -> Result<i32, Error> {
        match self.commands {
            Some(Commands::Version) => {
                std::io::stdout()
                    .write_all(Self::command().render_long_version().as_bytes())
                    .context(error::WriteStdoutSnafu)?;
                return Ok(0);
            }
            Some(Commands::Completions { shell }) => {
                let mut app = Self::command();
                let bin_name = app.get_name().to_string();
                clap_complete::generate(shell, &mut app, bin_name, &mut std::io::stdout());
                return Ok(0);
            }
            Some(Commands::DefaultConfig) => {
                std::io::stdout()
                    .write_all(Config::template_basic())
                    .context(error::WriteStdoutSnafu)?;
                return Ok(0);
            }
            _ => {}
        }

        let mut config = self.load_config()?;

        match self.commands {
            Some(Commands::Inject(cmd)) => {
                config.log.emit_stdout = false;
                config.log.emit_stderr = true;
                config.log.registry();
                cmd.run(&config)?;
            }
            Some(Commands::Validate) => {
                config.log.registry();
                validate::run(&config)?;
            }
            Some(Commands::Serve(cmd)) => {
                config.log.registry();
                cmd.run(config)?;
            }
            _ => {
                config.log.registry();
                ServeCommand::default().run(config)?;
            }
        }

        Ok(0)
    }
}
