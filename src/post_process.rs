//! The entry points the pipeline host calls.
//!
//! The host configures the post-processor once, then hands it every artifact its build produces.
//! Each artifact is processed in a straight line: read the image ID, announce it to TeamCity,
//! then update the cloud profile if a server is configured.

use derive_new::new;
use error_stack::{Report, ResultExt};
use getset::{CopyGetters, Getters};
use tracing::info;

use crate::{
    api::teamcity::cloud_profile,
    artifact::Artifact,
    config::{self, Config},
    context::ExecutionContext,
    notify,
    ui::Ui,
};

/// Errors that are possibly surfaced by the post-processor.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configuration was rejected.
    #[error("configure post-processor")]
    Configure,

    /// The HTTP client for the TeamCity server couldn't be set up.
    #[error("set up TeamCity client")]
    HttpClient,

    /// The image ID couldn't be read from the artifact.
    #[error("read image id from artifact")]
    Extract,

    /// The cloud profile couldn't be updated.
    #[error("update TeamCity cloud profile")]
    UpdateProfile,
}

/// What the post-processor hands back to the host.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters, new)]
pub struct Outcome {
    /// The artifact, unchanged.
    #[getset(get = "pub")]
    artifact: Artifact,

    /// Whether the host should keep the input artifact even if later steps fail.
    #[getset(get_copy = "pub")]
    keep_input: bool,

    /// Whether the host must honour `keep_input` even if the user asked otherwise.
    #[getset(get_copy = "pub")]
    force_override: bool,
}

impl Outcome {
    fn for_artifact(artifact: Artifact) -> Self {
        Self::new(artifact, true, false)
    }
}

/// A failed post-process step.
///
/// The artifact and flags are still handed back, so the host decides whether the build fails.
#[derive(Debug, Getters, new)]
#[getset(get = "pub")]
pub struct Failure {
    /// What the host gets back regardless of the failure.
    outcome: Outcome,

    /// What went wrong.
    report: Report<Error>,
}

impl Failure {
    /// Split the failure into its parts.
    pub fn into_parts(self) -> (Outcome, Report<Error>) {
        (self.outcome, self.report)
    }
}

/// Reports built images to TeamCity.
#[derive(Debug, Clone)]
pub struct PostProcessor {
    config: Config,
    client: Option<cloud_profile::Client>,
}

impl PostProcessor {
    /// Decode and validate configuration bundles, then set up the TeamCity client if one is configured.
    pub fn configure<I>(raws: I) -> Result<Self, Report<Error>>
    where
        I: IntoIterator<Item = serde_yaml::Value>,
    {
        let config = config::decode(raws).change_context(Error::Configure)?;
        Self::new(config)
    }

    /// Set up the post-processor from already validated configuration.
    pub fn new(config: Config) -> Result<Self, Report<Error>> {
        let client = config
            .teamcity()
            .clone()
            .map(cloud_profile::Client::new)
            .transpose()
            .change_context(Error::HttpClient)?;
        Ok(Self { config, client })
    }

    /// Report an artifact: announce its image to TeamCity and update the cloud profile.
    #[tracing::instrument(skip(self, ui), fields(build = %self.config.build_name()))]
    pub async fn post_process(
        &self,
        ctx: &ExecutionContext,
        ui: &dyn Ui,
        artifact: Artifact,
    ) -> Result<Outcome, Failure> {
        let image = match artifact.image().change_context(Error::Extract) {
            Ok(image) => image,
            Err(report) => return Err(Failure::new(Outcome::for_artifact(artifact), report)),
        };
        info!(image = %image.id(), region = ?image.region(), "read image from artifact");

        notify::notify(
            ctx,
            ui,
            self.config.mode(),
            self.config.build_name(),
            &artifact,
            &image,
        );

        let Some(client) = &self.client else {
            info!("no TeamCity server configured, skipping cloud profile update");
            return Ok(Outcome::for_artifact(artifact));
        };

        match client
            .update(artifact.family(), image.id())
            .await
            .change_context(Error::UpdateProfile)
        {
            Ok(update) => {
                ui.message(&update.to_string());
                Ok(Outcome::for_artifact(artifact))
            }
            Err(report) => Err(Failure::new(Outcome::for_artifact(artifact), report)),
        }
    }
}
