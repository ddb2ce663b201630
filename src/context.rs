//! The execution context a post-process step runs in.

use derive_new::new;
use getset::Getters;

/// The environment variable TeamCity sets inside its build steps.
pub const TEAMCITY_VERSION_VAR: &str = "TEAMCITY_VERSION";

/// Facts about the process environment, read once and passed explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters, new)]
#[getset(get = "pub")]
pub struct ExecutionContext {
    /// The version of the TeamCity agent running this process, if any.
    teamcity_version: Option<String>,
}

impl ExecutionContext {
    /// Whether this process runs inside a TeamCity build step.
    pub fn in_teamcity_build(&self) -> bool {
        matches!(&self.teamcity_version, Some(version) if !version.is_empty())
    }
}
