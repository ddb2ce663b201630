//! Build metadata used in error reports and documentation links.

use error_stack::{IntoReport, Report, ResultExt};
use once_cell::sync::OnceCell;
use semver::Version;

pub mod link;

/// Errors that are possibly surfaced reading build metadata.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The version Cargo compiled into the binary isn't valid semver.
    #[error("parse crate version '{0}'")]
    CrateVersion(&'static str),
}

/// The git SHA this binary was built from, set by `build.rs`.
pub const BUILD_SHA: &str = env!("GIT_HASH");

/// Where the source of this crate lives.
pub const REPO_HOME: &str = env!("CARGO_PKG_REPOSITORY");

/// The crate version, parsed once.
pub fn crate_version() -> Result<&'static Version, Report<Error>> {
    static VERSION: OnceCell<Version> = OnceCell::new();
    let raw = env!("CARGO_PKG_VERSION");
    VERSION
        .get_or_try_init(|| Version::parse(raw))
        .into_report()
        .change_context(Error::CrateVersion(raw))
}
