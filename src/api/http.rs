//! Interact with remote services over HTTP!

use derive_new::new;
use getset::Getters;

use crate::ext::secrecy::ComparableSecretString;

/// Credentials for 'HTTP Basic' authentication.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new)]
#[getset(get = "pub")]
pub struct BasicAuth {
    /// The username for authentication.
    username: String,

    /// The password for authentication.
    password: ComparableSecretString,
}

impl BasicAuth {
    /// Authenticate the request with these credentials.
    pub fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.basic_auth(&self.username, Some(self.password.expose_secret()))
    }
}
