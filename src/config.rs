//! Configuration for the post-processor.
//!
//! # Raw bundles
//!
//! The pipeline host hands configuration over as one or more untyped bundles.
//! Bundles are merged in order (later keys win) and then decoded strictly, see [`decode`].
//!
//! # Modes
//!
//! Two shapes of configuration are supported, selected by which fields are populated:
//! - [`Mode::CloudImage`]: the cloud image named by `cloud_image` is pointed at the new image.
//! - [`Mode::CustomImage`]: the cloud image named by `custom_image_name` is pointed at `agent_name`.
//!
//! # Validation vs Parsing
//!
//! Parsing types live in [`raw`] and don't outlive [`decode`].
//! Validation collects every violated rule before returning,
//! so that users can fix their configuration in one go.

use std::path::PathBuf;

use derive_new::new;
use error_stack::{Report, ResultExt};
use getset::{CopyGetters, Getters};

use crate::{
    api::teamcity,
    ext::{
        error_stack::{DescribeContext, ErrorHelper, IntoContext},
        io,
    },
};

mod args;
mod raw;

pub use args::{BaseArgs, RawBaseArgs};

/// The names of config files searched for in the working directory when none are provided.
pub const DISCOVERED_FILE_NAMES: &[&str] = &["teamcity.yml", "teamcity.yaml"];

/// Errors that are possibly surfaced loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Validate CLI arguments.
    #[error("validate command line arguments")]
    ValidateArgs,

    /// Read a config file from disk.
    #[error("read config file")]
    ReadFile,

    /// A config file isn't valid YAML.
    #[error("parse config file")]
    ParseFile,

    /// The merged bundles don't decode into the expected shape.
    #[error("decode configuration")]
    Decode,

    /// The decoded configuration violates one or more rules.
    #[error("validate configuration")]
    Validate,
}

/// Errors that are possibly surfaced during validation of config values.
///
/// A failed validation stacks one of these per violated rule.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// A field required by the configured mode is empty.
    #[error("{0} is required")]
    Missing(Field),

    /// The request timeout isn't a duration.
    #[error("timeout must be a duration, for example '30s'")]
    Timeout,

    /// Fields of both modes are set, so the cloud image to update is ambiguous.
    #[error("cloud_image cannot be combined with custom_image_name or agent_name")]
    AmbiguousMode,
}

/// Configuration fields subject to validation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    /// The TeamCity server base URL.
    TeamcityUrl,

    /// The TeamCity user.
    Username,

    /// The TeamCity user's password.
    Password,

    /// The TeamCity project owning the cloud profile.
    ProjectId,

    /// The cloud image to update, in cloud image mode.
    CloudImage,

    /// The cloud image to update, in custom image mode.
    CustomImageName,

    /// The value written to the cloud image, in custom image mode.
    AgentName,
}

/// The shape of configuration in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Mode {
    /// Point the cloud image named by `cloud_image` at the built image.
    CloudImage,

    /// Point the cloud image named by `custom_image_name` at `agent_name`.
    CustomImage,
}

impl Mode {
    /// The fields that must be set when a TeamCity server is configured.
    pub fn required_fields(self) -> &'static [Field] {
        match self {
            Mode::CloudImage => &[
                Field::Username,
                Field::Password,
                Field::ProjectId,
                Field::CloudImage,
            ],
            Mode::CustomImage => &[
                Field::Username,
                Field::Password,
                Field::ProjectId,
                Field::CustomImageName,
                Field::AgentName,
            ],
        }
    }
}

/// Validated config values to use during the program runtime.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters, new)]
pub struct Config {
    /// The name the pipeline host assigned to the build.
    #[getset(get = "pub")]
    build_name: String,

    /// The shape of configuration in use.
    #[getset(get_copy = "pub")]
    mode: Mode,

    /// The TeamCity server to update, if one is configured.
    #[getset(get = "pub")]
    teamcity: Option<teamcity::Config>,
}

/// Merge and validate raw configuration bundles.
#[tracing::instrument(skip_all)]
pub fn decode<I>(raws: I) -> Result<Config, Report<Error>>
where
    I: IntoIterator<Item = serde_yaml::Value>,
{
    let raw = raw::RawConfig::decode(raws).change_context(Error::Decode)?;
    raw.validate().change_context(Error::Validate)
}

/// Read config files from disk, then decode them with any additional bundles appended.
pub async fn load(
    paths: &[PathBuf],
    overrides: Vec<serde_yaml::Value>,
) -> Result<Config, Report<Error>> {
    let mut raws = Vec::with_capacity(paths.len() + overrides.len());
    for path in paths {
        let content = io::read_to_string(path)
            .await
            .change_context(Error::ReadFile)
            .help("ensure you have access to the file and that it exists")?;

        let raw = serde_yaml::from_str::<serde_yaml::Value>(&content)
            .context(Error::ParseFile)
            .describe_lazy(|| format!("parse config file at '{}'", path.display()))?;
        raws.push(raw);
    }

    raws.extend(overrides);
    decode(raws)
}

/// Validate the args provided by the user.
pub async fn validate_args(provided: RawBaseArgs) -> Result<BaseArgs, Report<Error>> {
    provided.validate().await.change_context(Error::ValidateArgs)
}

/// Every field name reported missing anywhere in the report.
pub fn missing_fields<C>(report: &Report<C>) -> Vec<Field> {
    let mut fields = report
        .frames()
        .filter_map(|frame| frame.downcast_ref::<ValidationError>())
        .filter_map(|err| match err {
            ValidationError::Missing(field) => Some(*field),
            ValidationError::Timeout | ValidationError::AmbiguousMode => None,
        })
        .collect::<Vec<_>>();
    fields.sort();
    fields.dedup();
    fields
}
