//! Artifacts produced by the image builder, and the image identifiers they carry.
//!
//! # Builder families
//!
//! Builders for Amazon images report their artifact ID as `region:image-id`;
//! every other builder reports an ID that is used as-is.
//! Producers may attach the [`BuilderFamily`] explicitly with [`Artifact::with_family`];
//! otherwise it is classified from the builder ID against [`AMAZON_BUILDER_IDS`].

use derive_new::new;
use error_stack::{report, Report};
use getset::{CopyGetters, Getters};

use crate::ext::error_stack::{DescribeContext, ErrorHelper};

/// Builder IDs whose artifact IDs are in the form `region:image-id`.
pub const AMAZON_BUILDER_IDS: [&str; 4] = [
    "mitchellh.amazonebs",
    "mitchellh.amazon.ebssurrogate",
    "mitchellh.amazon.instance",
    "mitchellh.amazon.chroot",
];

/// Errors that are possibly surfaced reading an artifact.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The artifact ID doesn't match the shape its builder family promises.
    #[error("malformed artifact id '{0}'")]
    MalformedArtifactId(String),
}

/// Describes the shape of artifact IDs a builder produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum BuilderFamily {
    /// Artifact IDs are `region:image-id`.
    Amazon,

    /// Artifact IDs are opaque and used as-is.
    Other,
}

impl BuilderFamily {
    /// Classify a builder ID.
    pub fn classify(builder_id: &str) -> Self {
        if AMAZON_BUILDER_IDS.contains(&builder_id) {
            Self::Amazon
        } else {
            Self::Other
        }
    }
}

/// The output of a build step, as handed over by the pipeline host.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct Artifact {
    /// The ID of the builder that produced the artifact.
    #[getset(get = "pub")]
    builder_id: String,

    /// The artifact ID as reported by the builder.
    #[getset(get = "pub")]
    id: String,

    /// The shape of the artifact ID.
    #[getset(get_copy = "pub")]
    family: BuilderFamily,
}

impl Artifact {
    /// Create an artifact, classifying its family from the builder ID.
    pub fn new(builder_id: impl Into<String>, id: impl Into<String>) -> Self {
        let builder_id = builder_id.into();
        let family = BuilderFamily::classify(&builder_id);
        Self {
            builder_id,
            id: id.into(),
            family,
        }
    }

    /// Attach an explicit builder family, overriding classification.
    pub fn with_family(self, family: BuilderFamily) -> Self {
        Self { family, ..self }
    }

    /// Read the image identifier out of the artifact ID.
    pub fn image(&self) -> Result<Image, Report<Error>> {
        match self.family {
            BuilderFamily::Other => Ok(Image::new(self.id.clone(), None)),
            BuilderFamily::Amazon => {
                let mut segments = self.id.split(':');
                let region = segments.next().unwrap_or_default();
                match segments.next() {
                    Some(image) if !image.is_empty() => {
                        Ok(Image::new(image.to_string(), Some(region.to_string())))
                    }
                    _ => Err(report!(Error::MalformedArtifactId(self.id.clone())))
                        .describe_lazy(|| format!("builder '{}' reports ids as 'region:image-id'", self.builder_id))
                        .help("ensure the builder finished successfully and produced an image"),
                }
            }
        }
    }
}

/// An image identifier read from an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new)]
#[getset(get = "pub")]
pub struct Image {
    /// The provider-native image ID, for example `ami-1234`.
    id: String,

    /// The region the image lives in, if the builder reports one.
    region: Option<String>,
}
