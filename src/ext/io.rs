//! Types and functions for validations requiring IO.
//!
//! These functions generally consist of an async wrapper around
//! synchronously executed blocking functions, run in a background worker thread.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use error_stack::{report, IntoReport, Report, ResultExt};
use tokio::task;

use crate::ext::{
    error_stack::{DescribeContext, ErrorHelper},
    iter::AlternativeIter,
};

/// Errors that are possibly surfaced during IO actions.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The provided path-like item failed validation.
    /// Often these errors are related to permissions or the path not existing.
    #[error("validate path")]
    ValidatePath,

    /// The provided file path does not reference a file on disk.
    #[error("path is not a regular file")]
    NotRegularFile,

    /// No names were provided to search for.
    #[error("no file names to search for")]
    NothingToFind,

    /// Failed to locate the current working directory.
    #[error("failed to locate working directory")]
    LocateWorkingDirectory,

    /// Failed to read the file.
    #[error("read file")]
    ReadFile,

    /// Failed to join the background thread that performed the backing IO operation.
    #[error("join background thread")]
    JoinWorker,
}

/// Searches the working directory for one of several provided names,
/// returning the first one that was found.
#[tracing::instrument]
pub async fn find_some(names: &'static [&'static str]) -> Result<PathBuf, Report<Error>> {
    run_background(move || {
        names
            .iter()
            .map(|name| check_cwd(name).and_then(validate_file))
            .alternative_fold()
            .unwrap_or_else(|| Err(report!(Error::NothingToFind)))
            .describe("searches the working directory")
    })
    .await
}

/// Read the file at the provided path to a string.
#[tracing::instrument]
pub async fn read_to_string(path: &Path) -> Result<String, Report<Error>> {
    let path = path.to_path_buf();
    run_background(move || {
        fs::read_to_string(&path)
            .into_report()
            .change_context(Error::ReadFile)
            .describe_lazy(|| format!("read file: {path:?}"))
    })
    .await
}

/// Validate that a file path exists and is a regular file.
fn validate_file(path: PathBuf) -> Result<PathBuf, Report<Error>> {
    let meta = fs::metadata(&path)
        .into_report()
        .change_context(Error::ValidatePath)
        .describe_lazy(|| format!("validate file: {path:?}"))
        .help("validate that you have access to the file and that it exists")?;

    if meta.is_file() {
        Ok(path)
    } else {
        Err(Error::NotRegularFile)
            .into_report()
            .attach_printable_lazy(|| format!("validate file: {path:?}"))
    }
}

/// Join the given file name onto the current working directory.
fn check_cwd(name: &str) -> Result<PathBuf, Report<Error>> {
    let cwd = env::current_dir()
        .into_report()
        .change_context(Error::LocateWorkingDirectory)
        .describe("this kind of error is typically caused by the current user not having access to the working directory")?;
    Ok(cwd.join(name))
}

/// Run the provided blocking closure in the background.
async fn run_background<T, F>(work: F) -> Result<T, Report<Error>>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, Report<Error>> + Send + 'static,
{
    task::spawn_blocking(work)
        .await
        .into_report()
        .change_context(Error::JoinWorker)
        .describe("some IO actions run in a background thread, and that thread was unable to be synchronized with the main process")
        .help("this is unlikely to be resolvable by an end user, although it may be environmental; try running again")?
}
