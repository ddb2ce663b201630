//! Types and functions for decoding raw configuration bundles.

use std::time::Duration;

use error_stack::{report, Report};
use humantime::parse_duration;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::{
    api::{http, teamcity},
    ext::{
        error_stack::{fold_error_stacks, DescribeContext, ErrorHelper, IntoContext},
        secrecy::ComparableSecretString,
    },
};

use super::{Config, Field, Mode, ValidationError};

/// Errors surfaced decoding raw bundles.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Every bundle must be a mapping of keys to values.
    #[error("configuration bundle {0} is not a mapping")]
    NotMapping(usize),

    /// The merged bundles don't match the expected shape.
    #[error("decode merged configuration bundles")]
    Shape,
}

/// Config values as handed over by the host.
/// The "Raw" prefix indicates that this is the initial parsed value before any validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(super) struct RawConfig {
    #[serde(deserialize_with = "lenient::string")]
    teamcity_url: String,
    #[serde(deserialize_with = "lenient::string")]
    username: String,
    #[serde(deserialize_with = "lenient::secret")]
    password: ComparableSecretString,
    #[serde(deserialize_with = "lenient::string")]
    project_id: String,
    #[serde(deserialize_with = "lenient::string")]
    cloud_image: String,
    #[serde(deserialize_with = "lenient::string")]
    custom_image_name: String,
    #[serde(deserialize_with = "lenient::string")]
    agent_name: String,
    #[serde(deserialize_with = "lenient::optional_string")]
    timeout: Option<String>,

    #[serde(deserialize_with = "lenient::string")]
    packer_build_name: String,
    #[serde(deserialize_with = "lenient::string")]
    packer_builder_type: String,
    #[serde(deserialize_with = "lenient::or_default")]
    packer_debug: bool,
    #[serde(deserialize_with = "lenient::or_default")]
    packer_force: bool,
    #[serde(deserialize_with = "lenient::string")]
    packer_on_error: String,
    #[serde(deserialize_with = "lenient::string")]
    packer_core_version: String,
    #[serde(deserialize_with = "lenient::string")]
    packer_template_path: String,
    #[serde(deserialize_with = "lenient::or_default")]
    packer_user_variables: Mapping,
    #[serde(deserialize_with = "lenient::or_default")]
    packer_sensitive_variables: Vec<String>,
}

impl RawConfig {
    /// Merge the bundles in order, later keys overriding earlier ones, then decode the result.
    pub(super) fn decode<I>(raws: I) -> Result<Self, Report<Error>>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut merged = Mapping::new();
        for (index, raw) in raws.into_iter().enumerate() {
            match raw {
                Value::Mapping(bundle) => merged.extend(bundle),
                // An empty YAML document parses to null.
                Value::Null => {}
                other => {
                    return Err(report!(Error::NotMapping(index)))
                        .describe_lazy(|| format!("provided bundle: {other:?}"))
                }
            }
        }

        let config = serde_yaml::from_value::<RawConfig>(Value::Mapping(merged))
            .context(Error::Shape)
            .help("check the field names and value types against the configuration reference")?;

        tracing::debug!(
            builder = %config.packer_builder_type,
            core_version = %config.packer_core_version,
            template = %config.packer_template_path,
            debug = config.packer_debug,
            force = config.packer_force,
            on_error = %config.packer_on_error,
            user_variables = config.packer_user_variables.len(),
            sensitive_variables = config.packer_sensitive_variables.len(),
            "decoded host configuration"
        );
        Ok(config)
    }

    /// The mode selected by the populated fields.
    pub(super) fn mode(&self) -> Mode {
        if self.custom_image_name.is_empty() && self.agent_name.is_empty() {
            Mode::CloudImage
        } else {
            Mode::CustomImage
        }
    }

    fn is_empty(&self, field: Field) -> bool {
        match field {
            Field::TeamcityUrl => self.teamcity_url.is_empty(),
            Field::Username => self.username.is_empty(),
            Field::Password => self.password.is_empty(),
            Field::ProjectId => self.project_id.is_empty(),
            Field::CloudImage => self.cloud_image.is_empty(),
            Field::CustomImageName => self.custom_image_name.is_empty(),
            Field::AgentName => self.agent_name.is_empty(),
        }
    }

    /// Validate every rule, stacking all violations into one report.
    pub(super) fn validate(self) -> Result<Config, Report<ValidationError>> {
        let mode = self.mode();
        let mut errors = Vec::new();

        let timeout = match self.timeout.as_deref().map(parse_timeout).transpose() {
            Ok(timeout) => timeout.unwrap_or(teamcity::DEFAULT_TIMEOUT),
            Err(err) => {
                errors.push(err);
                teamcity::DEFAULT_TIMEOUT
            }
        };

        let server_configured = !self.is_empty(Field::TeamcityUrl);
        if server_configured && mode == Mode::CustomImage && !self.is_empty(Field::CloudImage) {
            errors.push(
                report!(ValidationError::AmbiguousMode).attach_printable(format!(
                    "'cloud_image' is '{}', but 'custom_image_name' or 'agent_name' is also set",
                    self.cloud_image
                )),
            );
        }
        if server_configured {
            errors.extend(
                mode.required_fields()
                    .iter()
                    .filter(|field| self.is_empty(**field))
                    .map(|field| missing(mode, *field)),
            );
        }

        if let Some(errors) = fold_error_stacks(errors) {
            return Err(errors);
        }

        let teamcity = server_configured.then(|| {
            let profile = match mode {
                Mode::CloudImage => teamcity::Profile::new_cloud_image(self.cloud_image),
                Mode::CustomImage => {
                    teamcity::Profile::new_custom_image(self.custom_image_name, self.agent_name)
                }
            };
            teamcity::Config::new(
                teamcity::Endpoint::from(self.teamcity_url),
                http::BasicAuth::new(self.username, self.password),
                self.project_id,
                profile,
                timeout,
            )
        });

        Ok(Config::new(self.packer_build_name, mode, teamcity))
    }
}

fn missing(mode: Mode, field: Field) -> Report<ValidationError> {
    report!(ValidationError::Missing(field))
        .attach_printable(format!("'teamcity_url' is set, so {mode} mode requires '{field}'"))
}

fn parse_timeout(value: &str) -> Result<Duration, Report<ValidationError>> {
    parse_duration(value)
        .context(ValidationError::Timeout)
        .describe_lazy(|| format!("provided value: '{value}'"))
}

/// Host bundles are weakly typed: a blank key decodes to the zero value,
/// and scalars are accepted where a string is expected.
mod lenient {
    use serde::{de, Deserialize, Deserializer};
    use serde_yaml::Value;

    use crate::ext::secrecy::ComparableSecretString;

    pub(super) fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(String::new()),
            Value::String(value) => Ok(value),
            Value::Bool(value) => Ok(value.to_string()),
            Value::Number(value) => Ok(value.to_string()),
            other => Err(de::Error::custom(format!(
                "invalid value {other:?}, expected a string"
            ))),
        }
    }

    pub(super) fn secret<'de, D>(deserializer: D) -> Result<ComparableSecretString, D::Error>
    where
        D: Deserializer<'de>,
    {
        string(deserializer).map(ComparableSecretString::from)
    }

    pub(super) fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        string(deserializer).map(|value| Some(value).filter(|value| !value.is_empty()))
    }

    pub(super) fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
    }
}
