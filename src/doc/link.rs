//! Links into the repository's documentation at the commit this binary was built from.

use once_cell::sync::OnceCell;

use super::{BUILD_SHA, REPO_HOME};

/// The reference documentation for the post-processor configuration.
pub fn config_reference() -> &'static str {
    static LAZY: OnceCell<String> = OnceCell::new();
    LAZY.get_or_init(|| format!("{REPO_HOME}/blob/{BUILD_SHA}/docs/reference/config.md"))
}
