//! Covers logging and tracing.
//!
//! Standard output carries the build log (including TeamCity service messages),
//! so all diagnostics go to standard error or to trace files.

use std::{path::PathBuf, str::FromStr};

use derive_more::{AsRef, From};
use derive_new::new;
use error_stack::{report, IntoReport, Report, ResultExt};
use getset::{CopyGetters, Getters};
use tracing_appender::rolling;
use tracing_subscriber::{filter::LevelFilter, fmt::format::FmtSpan, prelude::*, Registry};

use crate::ext::error_stack::{DescribeContext, ErrorHelper};

/// The file name prefix for trace files.
pub const TRACE_FILE_PREFIX: &str = "packer-teamcity.trace";

/// Errors that are possibly surfaced when running debugging operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// When the trace sink is initialized, it is initialized as a global singleton.
    /// Future attempts to initialize it result in this error.
    /// This is a program logic error ("a bug"), and cannot be resolved by users.
    #[error("trace sink was configured again after being configured once")]
    TraceSinkReconfigured,
}

/// Errors that are possibly surfaced during validation of config values.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The log level is parsed from a user-provided string.
    #[error("parse log level")]
    LogLevel,
}

/// Validated config values for observability.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters, new)]
pub struct Config {
    /// The minimum level written to stderr.
    #[getset(get_copy = "pub")]
    level: LevelFilter,

    /// The location into which trace files are written, if any.
    #[getset(get = "pub")]
    trace_root: Option<Root>,
}

impl Config {
    /// Validate user-provided values.
    pub fn parse(level: &str, trace_root: Option<PathBuf>) -> Result<Self, Report<ValidationError>> {
        let level = LevelFilter::from_str(level)
            .map_err(|_| report!(ValidationError::LogLevel))
            .help("use one of 'off', 'error', 'warn', 'info', 'debug', or 'trace'")?;
        Ok(Self::new(level, trace_root.map(Root::from)))
    }

    /// Initialize tracing sinks:
    /// - Pretty sink of traces at the configured level to stderr.
    /// - If a trace root is configured, hourly rotating sink of all traces in JSON format to disk.
    ///
    /// Until this method is run, traces are not output anywhere and are lost forever;
    /// run it as soon as possible.
    pub fn initialize(&self) -> Result<(), Report<Error>> {
        let files = self.trace_root.as_ref().map(|root| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_span_events(FmtSpan::FULL)
                .with_writer(rolling::hourly(root.as_ref(), TRACE_FILE_PREFIX))
        });

        let subscriber = Registry::default()
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr)
                    .with_filter(self.level),
            )
            .with(files);

        tracing::subscriber::set_global_default(subscriber)
            .into_report()
            .change_context(Error::TraceSinkReconfigured)
            .help("if you're a user and you're seeing this, please report this as a defect")
            .describe("this is a program bug and is not something that users can fix")
    }
}

/// Trace files are written to this directory.
#[derive(Debug, Clone, PartialEq, Eq, AsRef, From, new)]
pub struct Root(PathBuf);
