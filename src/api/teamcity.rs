//! Interactions and data types for the TeamCity REST API live here.

use std::time::Duration;

use derive_more::{AsRef, Display};
use derive_new::new;
use getset::{CopyGetters, Getters};

use crate::{api::http, artifact::BuilderFamily, config::Mode};

pub mod cloud_profile;

/// The request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Validated config values for the TeamCity server.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters, new)]
pub struct Config {
    /// The base URL of the TeamCity server.
    #[getset(get = "pub")]
    endpoint: Endpoint,

    /// The credentials used to authenticate with the server.
    #[getset(get = "pub")]
    auth: http::BasicAuth,

    /// The TeamCity project owning the cloud profile.
    #[getset(get = "pub")]
    project_id: String,

    /// The cloud image to update, and what to write to it.
    #[getset(get = "pub")]
    profile: Profile,

    /// How long to wait for the server to respond.
    #[getset(get_copy = "pub")]
    timeout: Duration,
}

/// The base URL of the TeamCity server, without trailing slashes.
#[derive(Debug, Clone, PartialEq, Eq, AsRef, Display)]
pub struct Endpoint(String);

impl From<String> for Endpoint {
    fn from(input: String) -> Self {
        Self(input.trim_end_matches('/').to_string())
    }
}

impl Endpoint {
    /// Join a path onto the endpoint with exactly one slash between them.
    pub fn join(&self, path: &str) -> String {
        format!("{}/{}", self.0, path.trim_start_matches('/'))
    }
}

/// Which cloud image is updated, and what is written to it.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub enum Profile {
    /// The cloud image named `name` is pointed at the built image.
    CloudImage {
        /// The cloud image name.
        name: String,
    },

    /// The cloud image named `image_name` is pointed at `agent_name`.
    CustomImage {
        /// The cloud image name.
        image_name: String,

        /// The value written to the cloud image.
        agent_name: String,
    },
}

impl Profile {
    /// The configuration mode this profile belongs to.
    pub fn mode(&self) -> Mode {
        match self {
            Profile::CloudImage { .. } => Mode::CloudImage,
            Profile::CustomImage { .. } => Mode::CustomImage,
        }
    }

    /// The name of the cloud image being updated.
    pub fn image_name(&self) -> &str {
        match self {
            Profile::CloudImage { name } => name.as_str(),
            Profile::CustomImage { image_name, .. } => image_name.as_str(),
        }
    }

    /// The value written to the cloud image, given the image that was built.
    pub fn value<'a>(&'a self, image_id: &'a str) -> &'a str {
        match self {
            Profile::CloudImage { .. } => image_id,
            Profile::CustomImage { agent_name, .. } => agent_name.as_str(),
        }
    }

    /// The property of the cloud image that is written, in the form
    /// `(selector property, selector value, written property)`.
    fn property(&self, family: BuilderFamily) -> (&'static str, &str, &'static str) {
        match (self, family) {
            (Profile::CloudImage { name }, BuilderFamily::Amazon) => {
                ("image-name-prefix", name.as_str(), "amazon-id")
            }
            (Profile::CloudImage { name }, BuilderFamily::Other) => {
                ("source-id", name.as_str(), "sourceVmName")
            }
            (Profile::CustomImage { image_name, .. }, _) => {
                ("source-id", image_name.as_str(), "sourceVmName")
            }
        }
    }
}

impl Config {
    /// The REST URL of the cloud image property this config updates for the given builder family.
    pub fn property_url(&self, family: BuilderFamily) -> String {
        let (selector, image, property) = self.profile.property(family);
        let project = &self.project_id;
        self.endpoint.join(&format!(
            "httpAuth/app/rest/projects/id:{project}/projectFeatures/type:CloudImage,property(name:{selector},value:{image})/properties/{property}"
        ))
    }
}
