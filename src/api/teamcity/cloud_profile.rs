//! Updates a cloud image property of a TeamCity cloud profile.

use std::fmt;

use derive_new::new;
use error_stack::{report, Report};
use getset::Getters;
use reqwest::{header::CONTENT_TYPE, StatusCode};
use tracing::{debug, info};
use url::Url;

use crate::{
    artifact::BuilderFamily,
    ext::error_stack::{DescribeContext, ErrorHelper, IntoContext},
};

use super::Config;

/// Errors that are possibly surfaced updating a cloud profile.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The HTTP client couldn't be set up.
    #[error("build HTTP client")]
    Client,

    /// The request couldn't be built, usually because the URL is malformed.
    #[error("construct request to '{0}'")]
    RequestConstruction(String),

    /// The request couldn't be delivered, or no response arrived.
    #[error("send request to TeamCity")]
    Transport,

    /// TeamCity responded with something other than '200 OK'.
    #[error("error updating a cloud profile: {0}")]
    RemoteStatus(String),
}

/// A completed update.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new)]
#[getset(get = "pub")]
pub struct Update {
    /// The cloud image that was updated.
    image_name: String,

    /// The value now stored in the cloud image.
    value: String,
}

impl fmt::Display for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cloud agent image '{}' is switched to image '{}'",
            self.image_name, self.value
        )
    }
}

/// Talks to the TeamCity REST API.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    config: Config,
}

impl Client {
    /// Set up a client for the configured server.
    pub fn new(config: Config) -> Result<Self, Report<Error>> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .context(Error::Client)
            .describe("the HTTP client is set up once, when the post-processor is configured")?;
        Ok(Self { http, config })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Point the configured cloud image at the built image.
    ///
    /// This is attempted exactly once; retrying is left to the caller.
    #[tracing::instrument(skip(self))]
    pub async fn update(&self, family: BuilderFamily, image_id: &str) -> Result<Update, Report<Error>> {
        let url = self.config.property_url(family);
        let image_name = self.config.profile().image_name().to_string();
        let value = self.config.profile().value(image_id).to_string();

        let target = Url::parse(&url)
            .context_lazy(|| Error::RequestConstruction(url.clone()))
            .help("ensure 'teamcity_url' is an absolute URL, for example 'https://teamcity.example.com'")?;
        let request = self
            .config
            .auth()
            .apply(self.http.put(target))
            .header(CONTENT_TYPE, "text/plain")
            .body(value.clone())
            .build()
            .context_lazy(|| Error::RequestConstruction(url.clone()))?;

        debug!(%url, "updating cloud profile");
        let response = self
            .http
            .execute(request)
            .await
            .context(Error::Transport)
            .describe_lazy(|| format!("PUT {url}"))
            .help("ensure the TeamCity server is reachable from this machine")?;

        // Nothing in the body is used; release the connection before anything else happens.
        let status = response.status();
        drop(response);

        if status != StatusCode::OK {
            let auth_failed = matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN);
            return Err(report!(Error::RemoteStatus(status.to_string())))
                .describe_lazy(|| format!("PUT {url}"))
                .help_lazy(|| {
                    if auth_failed {
                        "ensure the configured user exists and may edit the project's cloud profiles"
                    } else {
                        "ensure 'project_id' and the configured cloud image exist on the server"
                    }
                });
        }

        info!(%image_name, %value, "updated cloud profile");
        Ok(Update::new(image_name, value))
    }
}
