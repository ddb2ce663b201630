//! Extensions to `error_stack`.

use colored::Colorize;
use error_stack::{Context, IntoReport, Report, ResultExt};

/// Merge multiple error stacks into a single error stack, so that
/// all of them are reported at the same time.
///
/// ```ignore
/// merge_error_stacks!(first, second, third)
/// ```
macro_rules! merge_error_stacks {
    ($first:expr, $($rest:expr),+ $(,)?) => {{
        let mut merged = $first;
        $(merged.extend_one($rest);)+
        merged
    }};
}

pub(crate) use merge_error_stacks;

/// Fold any number of error stacks into a single stack.
///
/// Returns `None` if there were no stacks to fold.
pub fn fold_error_stacks<C, I>(reports: I) -> Option<Report<C>>
where
    I: IntoIterator<Item = Report<C>>,
{
    reports.into_iter().fold(None, |merged, next| match merged {
        Some(merged) => Some(merge_error_stacks!(merged, next)),
        None => Some(next),
    })
}

/// Used to provide help text to an error.
///
/// This is meant to be readable by users of the application;
/// ideally help text is relatively terse and only displayed when
/// you're pretty sure what the user can do to fix the problem.
pub trait ErrorHelper {
    /// Provide help text to the user with what they can do to fix the problem.
    fn help<S: AsRef<str>>(self, help_text: S) -> Self;

    /// Lazily provide help text to the user with what they can do to fix the problem.
    fn help_lazy<S: AsRef<str>, F: FnOnce() -> S>(self, helper: F) -> Self;
}

impl<T, C> ErrorHelper for error_stack::Result<T, C> {
    fn help<S: AsRef<str>>(self, help_text: S) -> Self {
        let help = help_literal();
        let help_text = help_text.as_ref();
        self.attach_printable_lazy(|| format!("{help} {help_text}"))
    }

    fn help_lazy<S: AsRef<str>, F: FnOnce() -> S>(self, helper: F) -> Self {
        let help = help_literal();
        let help_text = helper();
        let help_text = help_text.as_ref();
        self.attach_printable_lazy(|| format!("{help} {help_text}"))
    }
}

fn help_literal() -> String {
    "help:".bold().blue().to_string()
}

/// Used to provide a description of the operation being performed when an error occurred.
pub trait DescribeContext {
    /// Provide a human-readable description of the context in which the error occurred.
    fn describe<S: AsRef<str>>(self, description: S) -> Self;

    /// Lazily provide a human-readable description of the context in which the error occurred.
    fn describe_lazy<S: AsRef<str>, F: FnOnce() -> S>(self, describer: F) -> Self;
}

impl<T, C> DescribeContext for error_stack::Result<T, C> {
    fn describe<S: AsRef<str>>(self, description: S) -> Self {
        let context = describe_literal();
        let description = description.as_ref();
        self.attach_printable_lazy(|| format!("{context} {description}"))
    }

    fn describe_lazy<S: AsRef<str>, F: FnOnce() -> S>(self, describer: F) -> Self {
        let context = describe_literal();
        let description = describer();
        let description = description.as_ref();
        self.attach_printable_lazy(|| format!("{context} {description}"))
    }
}

fn describe_literal() -> String {
    "context:".bold().green().to_string()
}

/// Used to point users at documentation relevant to an error.
pub trait ErrorDocReference {
    /// Lazily provide a link to documentation the user can read to resolve the problem.
    fn documentation_lazy<S: AsRef<str>, F: FnOnce() -> S>(self, doc: F) -> Self;
}

impl<T, C> ErrorDocReference for error_stack::Result<T, C> {
    fn documentation_lazy<S: AsRef<str>, F: FnOnce() -> S>(self, doc: F) -> Self {
        let literal = "documentation:".bold().cyan().to_string();
        let doc = doc();
        let doc = doc.as_ref();
        self.attach_printable_lazy(|| format!("{literal} {doc}"))
    }
}

/// Used for errors that end the program, so that the user knows where to go next.
pub trait FatalErrorReport {
    /// Ask the user to report the problem if they can't resolve it.
    fn request_support(self) -> Self;
}

impl<T, C> FatalErrorReport for error_stack::Result<T, C> {
    fn request_support(self) -> Self {
        let literal = "support:".bold().red().to_string();
        let home = crate::doc::REPO_HOME;
        self.attach_printable_lazy(|| {
            format!("{literal} if you believe this is a defect, please open an issue at {home}/issues")
        })
    }
}

/// Converts a plain `Result` whose error is a [`Context`] into a report
/// wrapped in a new context, in one step.
pub trait IntoContext<T> {
    /// Convert into a report, then change its context to the one provided.
    fn context<C: Context>(self, context: C) -> error_stack::Result<T, C>;

    /// Convert into a report, then change its context to the one lazily provided.
    fn context_lazy<C: Context, F: FnOnce() -> C>(self, context: F) -> error_stack::Result<T, C>;
}

impl<T, E: Context> IntoContext<T> for Result<T, E> {
    fn context<C: Context>(self, context: C) -> error_stack::Result<T, C> {
        self.into_report().change_context(context)
    }

    fn context_lazy<C: Context, F: FnOnce() -> C>(self, context: F) -> error_stack::Result<T, C> {
        self.into_report().change_context_lazy(context)
    }
}
