//! TeamCity service messages announcing the built image.
//!
//! Values are written as-is: TeamCity's escaping rules for `'`, `|`, `[` and `]`
//! are not applied, which is fine for the image and region IDs cloud providers hand out.

use std::fmt;

use derive_new::new;
use getset::Getters;
use tracing::debug;

use crate::{
    artifact::{Artifact, BuilderFamily, Image},
    config::Mode,
    context::ExecutionContext,
    ui::Ui,
};

/// Prefix for every parameter this post-processor sets.
pub const PARAMETER_PREFIX: &str = "packer.artifact";

/// A `setParameter` service message.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new)]
#[getset(get = "pub")]
pub struct SetParameter {
    /// The parameter name.
    name: String,

    /// The parameter value.
    value: String,
}

impl fmt::Display for SetParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "##teamcity[setParameter name='{}' value='{}']",
            self.name, self.value
        )
    }
}

fn parameter(key: &str, value: &str) -> SetParameter {
    SetParameter::new(format!("{PARAMETER_PREFIX}.{key}"), value.to_string())
}

/// The messages announcing an artifact, in the order they are written.
pub fn messages(mode: Mode, build_name: &str, artifact: &Artifact, image: &Image) -> Vec<SetParameter> {
    match (mode, artifact.family()) {
        (Mode::CloudImage, _) => vec![parameter(&format!("{build_name}.id"), image.id())],
        (Mode::CustomImage, BuilderFamily::Amazon) => {
            let region = image.region().as_deref().unwrap_or_default();
            vec![
                parameter("aws.region", region),
                parameter("aws.ami", image.id()),
            ]
        }
        (Mode::CustomImage, BuilderFamily::Other) => vec![
            parameter(&format!("{build_name}.id"), artifact.id()),
            parameter("last.id", artifact.id()),
        ],
    }
}

/// Announce the artifact to TeamCity, if running inside a TeamCity build.
#[tracing::instrument(skip(ui))]
pub fn notify(
    ctx: &ExecutionContext,
    ui: &dyn Ui,
    mode: Mode,
    build_name: &str,
    artifact: &Artifact,
    image: &Image,
) {
    if !ctx.in_teamcity_build() {
        debug!("not running inside a TeamCity build, skipping service messages");
        return;
    }

    for message in messages(mode, build_name, artifact, image) {
        ui.message(&message.to_string());
    }
}
