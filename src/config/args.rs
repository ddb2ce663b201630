//! Types and functions for parsing & validating CLI arguments.

use std::path::PathBuf;

use clap::Args;
use derive_new::new;
use error_stack::{Report, ResultExt};
use getset::Getters;
use serde::Serialize;

use crate::{
    context::{ExecutionContext, TEAMCITY_VERSION_VAR},
    debug,
    ext::{
        error_stack::{merge_error_stacks, DescribeContext, ErrorHelper},
        io,
        result::WrapOk,
    },
};

/// Errors that are possibly surfaced during validation of CLI arguments.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No config file was provided and none was able to be located.
    #[error("locate config file")]
    ConfigFileLocation,

    /// The logging arguments are not valid.
    #[error("validate logging arguments")]
    Debug,
}

/// Base arguments, used in every subcommand.
/// The "Raw" prefix indicates that this is the initial parsed value before any validation.
///
/// By the time `clap` hands us this structure, it's been successfully parsed;
/// this type is public because the binary needs to hand it to `clap`.
#[derive(Debug, Clone, Args, Serialize, new)]
pub struct RawBaseArgs {
    /// Paths to configuration bundles, merged in the order provided.
    ///
    /// If unset, `teamcity.yml` or `teamcity.yaml` is searched for in the current working directory.
    #[arg(short = 'c', long = "config-file")]
    config_file_paths: Vec<String>,

    /// The minimum level of log output written to stderr.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// If set, every trace is also written to hourly rotating JSON files in this directory.
    #[arg(long)]
    trace_dir: Option<String>,

    /// Set by TeamCity inside its build steps; enables service messages.
    #[arg(long, env = TEAMCITY_VERSION_VAR, hide = true)]
    teamcity_version: Option<String>,
}

impl RawBaseArgs {
    /// Validate the raw args provided.
    ///
    /// If the user did not provide config files, this function discovers one on disk
    /// or errors if none is able to be found.
    pub async fn validate(self) -> Result<BaseArgs, Report<Error>> {
        let config_paths = if self.config_file_paths.is_empty() {
            io::find_some(crate::config::DISCOVERED_FILE_NAMES)
                .await
                .change_context(Error::ConfigFileLocation)
                .help("consider providing an explicit '--config-file' argument instead")
                .map(|path| vec![path])
        } else {
            self.config_file_paths
                .into_iter()
                .map(PathBuf::from)
                .collect::<Vec<_>>()
                .wrap_ok()
        };

        let level = self.log_level;
        let debug = debug::Config::parse(&level, self.trace_dir.map(PathBuf::from))
            .change_context(Error::Debug)
            .describe_lazy(|| format!("provided log level: '{level}'"));

        let context = ExecutionContext::new(self.teamcity_version);

        // Report every problem with the arguments at once.
        match (config_paths, debug) {
            (Ok(config_paths), Ok(debug)) => Ok(BaseArgs {
                config_paths,
                debug,
                context,
            }),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), Ok(_)) => Err(err),
            (Err(first), Err(second)) => Err(merge_error_stacks!(first, second)),
        }
    }
}

/// Base arguments, used in every subcommand.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct BaseArgs {
    /// The configuration bundles to load, in order.
    config_paths: Vec<PathBuf>,

    /// Logging configuration.
    debug: debug::Config,

    /// The environment the process runs in.
    context: ExecutionContext,
}
