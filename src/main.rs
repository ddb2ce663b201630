//! The `packer-teamcity` binary.

#![deny(clippy::unwrap_used)]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![warn(rust_2018_idioms)]

use clap::{Args, Parser, Subcommand};
use error_stack::{bail, fmt::ColorMode, Report, Result, ResultExt};
use indoc::indoc;
use packer_teamcity::{
    artifact::Artifact,
    config,
    doc::{self, crate_version},
    ext::error_stack::{DescribeContext, ErrorDocReference, ErrorHelper, FatalErrorReport},
    post_process::PostProcessor,
    ui::{self, Ui},
};
use serde_yaml::{Mapping, Value};
use tracing::info;

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("determine effective configuration")]
    DetermineEffectiveConfig,

    #[error("a fatal error occurred during internal configuration")]
    InternalSetup,

    #[error("report artifact to TeamCity")]
    PostProcess,

    #[error("interrupted before the artifact was reported")]
    Interrupted,
}

#[derive(Debug, Parser)]
#[clap(version)]
struct Opts {
    /// packer-teamcity can run a number of subcommands.
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate configuration without reporting anything.
    Validate(config::RawBaseArgs),

    /// Report a built artifact to TeamCity.
    PostProcess(PostProcessArgs),
}

/// Arguments describing the artifact to report.
#[derive(Debug, Args)]
struct PostProcessArgs {
    #[command(flatten)]
    base: config::RawBaseArgs,

    /// The ID of the builder that produced the artifact, for example 'mitchellh.amazonebs'.
    #[arg(long)]
    builder_id: String,

    /// The artifact ID reported by the builder, for example 'us-east-1:ami-1234'.
    #[arg(long)]
    artifact_id: String,

    /// The name the pipeline assigned to the build. Overrides 'packer_build_name'.
    #[arg(long)]
    build_name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // App-wide setup goes here.
    Report::set_color_mode(ColorMode::Color);
    let version = crate_version()
        .change_context(Error::InternalSetup)
        .request_support()?;

    // Subcommand routing.
    let Opts { command } = Opts::parse();
    match command {
        Commands::Validate(args) => main_validate(args).await,
        Commands::PostProcess(args) => main_post_process(args).await,
    }
    .request_support()
    .describe_lazy(|| format!("packer-teamcity version: {version}"))
}

/// Validate configuration bundles.
async fn main_validate(args: config::RawBaseArgs) -> Result<(), Error> {
    let args = config::validate_args(args)
        .await
        .change_context(Error::DetermineEffectiveConfig)
        .help("try running with the '--help' argument to see available options and usage suggestions")?;

    args.debug()
        .initialize()
        .change_context(Error::InternalSetup)?;

    let conf = config::load(args.config_paths(), Vec::new())
        .await
        .change_context(Error::DetermineEffectiveConfig)
        .documentation_lazy(doc::link::config_reference)?;

    info!("Loaded {conf:?}");
    let server = match conf.teamcity() {
        Some(teamcity) => format!("updates cloud image '{}'", teamcity.profile().image_name()),
        None => String::from("updates no cloud profile"),
    };
    ui::Stdout.message(&format!("configuration is valid: {} mode, {server}", conf.mode()));
    Ok(())
}

/// Report a built artifact.
async fn main_post_process(args: PostProcessArgs) -> Result<(), Error> {
    let PostProcessArgs {
        base,
        builder_id,
        artifact_id,
        build_name,
    } = args;

    let args = config::validate_args(base)
        .await
        .change_context(Error::DetermineEffectiveConfig)
        .help("try running with the '--help' argument to see available options and usage suggestions")?;

    args.debug()
        .initialize()
        .change_context(Error::InternalSetup)?;

    let overrides = build_name
        .map(|name| {
            let mut bundle = Mapping::new();
            bundle.insert(Value::from("packer_build_name"), Value::from(name));
            Value::Mapping(bundle)
        })
        .into_iter()
        .collect();

    let conf = config::load(args.config_paths(), overrides)
        .await
        .change_context(Error::DetermineEffectiveConfig)
        .documentation_lazy(doc::link::config_reference)?;

    let processor = PostProcessor::new(conf).change_context(Error::InternalSetup)?;
    let artifact = Artifact::new(builder_id, artifact_id);

    let outcome = tokio::select! {
        outcome = processor.post_process(args.context(), &ui::Stdout, artifact) => outcome,
        _ = tokio::signal::ctrl_c() => bail!(Error::Interrupted),
    };

    match outcome {
        Ok(outcome) => {
            info!(keep_input = outcome.keep_input(), "reported {:?}", outcome.artifact());
            Ok(())
        }
        Err(failure) => {
            let (outcome, report) = failure.into_parts();
            Err(report.change_context(Error::PostProcess)).describe_lazy(|| {
                format!(
                    "artifact '{}' is returned with keep_input: {}, force_override: {}",
                    outcome.artifact().id(),
                    outcome.keep_input(),
                    outcome.force_override(),
                )
            })
            .help(indoc! {"
            The artifact itself was built; only reporting it failed.
            Service messages already written to the build log are not retracted, so the
            cloud profile may still point at the previous image. Review the error above,
            then either rerun the build or update the cloud profile manually.
            "})
        }
    }
}
