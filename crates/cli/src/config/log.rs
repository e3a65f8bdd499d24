//! Configuration and initialization for application logging.
//!
//! [`LogConfig`] describes where log records go (stdout, stderr, a file), how
//! they are rendered (human readable or JSON lines) and which level is
//! recorded. [`LogConfig::registry`] installs the matching `tracing`
//! subscriber.
use std::{fmt, fs::OpenOptions, path::PathBuf, str::FromStr, sync::Mutex};

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use snafu::Snafu;
use tracing_subscriber::{
    Layer, fmt::writer::BoxMakeWriter, layer::SubscriberExt, registry::LookupSpan,
    util::SubscriberInitExt,
};

/// Represents the configuration for the application's logging system.
#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogConfig {
    /// Optional path to a file where logs should be appended.
    #[serde(default = "LogConfig::default_file_path")]
    pub file_path: Option<PathBuf>,

    /// Whether logs should be emitted to standard output.
    #[serde(default = "LogConfig::default_emit_stdout")]
    pub emit_stdout: bool,

    /// Whether logs should be emitted to standard error.
    #[serde(default = "LogConfig::default_emit_stderr")]
    pub emit_stderr: bool,

    /// Rendering of each record.
    #[serde(default)]
    #[serde_as(as = "DisplayFromStr")]
    pub format: LogFormat,

    /// The minimum log level to be recorded.
    #[serde(default = "LogConfig::default_log_level")]
    #[serde_as(as = "DisplayFromStr")]
    pub level: tracing::Level,
}

impl Default for LogConfig {
    /// `INFO` records, rendered for a console, written to stdout only.
    fn default() -> Self {
        Self {
            file_path: Self::default_file_path(),
            emit_stdout: Self::default_emit_stdout(),
            emit_stderr: Self::default_emit_stderr(),
            format: LogFormat::default(),
            level: Self::default_log_level(),
        }
    }
}

impl LogConfig {
    #[inline]
    #[must_use]
    pub const fn default_log_level() -> tracing::Level { tracing::Level::INFO }

    #[inline]
    #[must_use]
    pub const fn default_file_path() -> Option<PathBuf> { None }

    #[inline]
    #[must_use]
    pub const fn default_emit_stdout() -> bool { true }

    #[inline]
    #[must_use]
    pub const fn default_emit_stderr() -> bool { false }

    /// Initializes the global `tracing` subscriber registry based on this
    /// `LogConfig`.
    ///
    /// # Panics
    ///
    /// Panics if a global subscriber has already been installed in this
    /// process.
    pub fn registry(&self) {
        let Self { file_path, emit_stdout, emit_stderr, format, level } = self;

        let filter_layer = tracing_subscriber::filter::LevelFilter::from_level(*level);

        tracing_subscriber::registry()
            .with(filter_layer)
            .with(file_path.clone().and_then(|path| LogDriver::File(path).layer(*format)))
            .with(emit_stdout.then(|| LogDriver::Stdout.layer(*format)).flatten())
            .with(emit_stderr.then(|| LogDriver::Stderr.layer(*format)).flatten())
            .init();
    }
}

/// Rendering of log records.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LogFormat {
    /// Multi-line, human readable output.
    #[default]
    Console,
    /// One JSON object per record, for log collectors.
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Console => "console",
            Self::Json => "json",
        })
    }
}

impl FromStr for LogFormat {
    type Err = ParseLogFormatError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "console" => Ok(Self::Console),
            "json" => Ok(Self::Json),
            _ => InvalidSnafu { value }.fail(),
        }
    }
}

#[derive(Debug, Snafu)]
pub enum ParseLogFormatError {
    #[snafu(display("'{value}' is not a valid log format, expected 'console' or 'json'"))]
    Invalid { value: String },
}

/// Destinations a formatted record can be written to.
#[derive(Clone, Debug)]
enum LogDriver {
    Stdout,
    Stderr,
    File(PathBuf),
}

impl LogDriver {
    /// Creates a formatting layer writing to this destination.
    ///
    /// Returns `None` if the log file cannot be opened for appending.
    fn layer<S>(self, format: LogFormat) -> Option<Box<dyn Layer<S> + Send + Sync + 'static>>
    where
        S: tracing::Subscriber,
        for<'a> S: LookupSpan<'a>,
    {
        let writer = match self {
            Self::Stdout => BoxMakeWriter::new(std::io::stdout),
            Self::Stderr => BoxMakeWriter::new(std::io::stderr),
            Self::File(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path).ok()?;
                BoxMakeWriter::new(Mutex::new(file))
            }
        };

        let fmt = tracing_subscriber::fmt::layer()
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_writer(writer);

        match format {
            LogFormat::Console => Some(Box::new(fmt.pretty())),
            LogFormat::Json => Some(Box::new(fmt.json())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_format() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Console".parse::<LogFormat>().unwrap(), LogFormat::Console);
        assert!(matches!(
            "logfmt".parse::<LogFormat>(),
            Err(ParseLogFormatError::Invalid { .. })
        ));
    }

    #[test]
    fn test_log_format_display_parses_back() {
        for format in [LogFormat::Console, LogFormat::Json] {
            assert_eq!(format.to_string().parse::<LogFormat>().unwrap(), format);
        }
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: LogConfig = serde_yaml::from_str("level: DEBUG\nformat: json\n").unwrap();

        assert_eq!(config.level, tracing::Level::DEBUG);
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.emit_stdout);
        assert!(!config.emit_stderr);
        assert!(config.file_path.is_none());
    }

    #[test]
    fn test_deserialize_empty_document() {
        let config: LogConfig = serde_yaml::from_str("{}").unwrap();

        assert_eq!(config.level, tracing::Level::INFO);
        assert_eq!(config.format, LogFormat::Console);
    }
}
