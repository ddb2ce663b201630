//! The message sink build output is written to.

use std::io::Write;

/// Receives human and machine readable lines for the build log.
pub trait Ui {
    /// Write a line to the build log.
    fn message(&self, line: &str);
}

/// Writes build log lines to standard output.
///
/// TeamCity reads service messages from standard output,
/// so diagnostics are logged elsewhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stdout;

impl Ui for Stdout {
    fn message(&self, line: &str) {
        let mut stdout = std::io::stdout().lock();
        // Build log output is best-effort.
        if let Err(err) = writeln!(stdout, "{line}").and_then(|_| stdout.flush()) {
            tracing::warn!(%err, "write build log line");
        }
    }
}
