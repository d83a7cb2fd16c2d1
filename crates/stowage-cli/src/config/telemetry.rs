//! Logging configuration.

use clap::{Args, ValueEnum};

/// Output format of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines, colored when stderr is a terminal.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
///
/// Logs always go to stderr so command output on stdout stays clean.
#[derive(Debug, Clone, Args)]
pub struct TelemetryConfig {
    /// Default log filter, used when `RUST_LOG` is not set.
    ///
    /// Accepts `tracing` filter directives, e.g. `stowage=debug,opendal=info`.
    #[arg(long, env = "STOWAGE_LOG", default_value = TelemetryConfig::DEFAULT_FILTER)]
    pub log_filter: String,

    /// Format of log lines.
    #[arg(long, env = "STOWAGE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl TelemetryConfig {
    /// Filter applied when neither `RUST_LOG` nor `--log-filter` is given.
    pub const DEFAULT_FILTER: &'static str = "warn";
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: Self::DEFAULT_FILTER.to_owned(),
            log_format: LogFormat::default(),
        }
    }
}
