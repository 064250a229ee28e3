//! Human-readable progress output on stderr.

use std::io::Write;

use tappack::events::{BuildEvent, BuildObserver};

/// Renders build events as lines on a writer.
///
/// Warnings and the final written-archive line are always shown; other
/// progress is suppressed in quiet mode.
pub struct StderrObserver<'a> {
    out: &'a mut dyn Write,
    quiet: bool,
}

impl<'a> StderrObserver<'a> {
    /// Write events to `out`.
    #[must_use]
    pub const fn new(out: &'a mut dyn Write, quiet: bool) -> Self {
        Self { out, quiet }
    }
}

impl BuildObserver for StderrObserver<'_> {
    fn on_event(&mut self, event: BuildEvent) {
        if event.is_warning() {
            write_stderr_line(self.out, format_args!("warning: {event}"));
        } else if !self.quiet || matches!(event, BuildEvent::ArchiveWritten { .. }) {
            write_stderr_line(self.out, event);
        }
    }
}

/// Write one line, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}
