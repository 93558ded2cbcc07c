//! Exit reporting

use std::io::{self, Write};
use tracing::warn;

use crate::TerminationOutcome;

/// Final result of an invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub exit_code: i32,
    pub diagnostic: Option<String>,
}

/// Writes the outcome's diagnostic to the error stream and resolves its exit code
pub struct ExitReporter<W: Write> {
    err: W,
}

impl ExitReporter<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> ExitReporter<W> {
    pub fn new(err: W) -> Self {
        Self { err }
    }

    pub fn into_inner(self) -> W {
        self.err
    }

    /// Resolve an outcome. The diagnostic, if any, is flushed before this returns.
    pub fn report(&mut self, outcome: &TerminationOutcome) -> Report {
        let diagnostic = outcome.diagnostic();

        if let Some(line) = &diagnostic {
            if let Err(e) = writeln!(self.err, "{}", line).and_then(|_| self.err.flush()) {
                warn!(error = %e, "Failed to write diagnostic");
            }
        }

        Report {
            exit_code: outcome.exit_code(),
            diagnostic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LAUNCH_FAILED_EXIT_CODE, TIMEOUT_EXIT_CODE, TimeoutPolicy};
    use dockhand_host_api::{ExitStatus, HostError};
    use std::time::Duration;

    fn written(reporter: ExitReporter<Vec<u8>>) -> String {
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn timeout_writes_exact_line() {
        let mut reporter = ExitReporter::new(Vec::new());
        let report = reporter.report(&TerminationOutcome::TimedOut {
            timeout: TimeoutPolicy::new(Duration::from_secs(1)),
            status: Some(ExitStatus::signaled(9)),
            kill_error: None,
        });

        assert_eq!(report.exit_code, TIMEOUT_EXIT_CODE);
        assert_eq!(written(reporter), "Killing command due to timeout (1s)\n");
    }

    #[test]
    fn normal_exit_is_silent() {
        let mut reporter = ExitReporter::new(Vec::new());
        let report = reporter.report(&TerminationOutcome::NormalExit(ExitStatus::with_code(7)));

        assert_eq!(report.exit_code, 7);
        assert_eq!(report.diagnostic, None);
        assert!(written(reporter).is_empty());
    }

    #[test]
    fn launch_failure_is_reported() {
        let mut reporter = ExitReporter::new(Vec::new());
        let report = reporter.report(&TerminationOutcome::LaunchFailed(HostError::EmptyCommand));

        assert_eq!(report.exit_code, LAUNCH_FAILED_EXIT_CODE);
        assert_eq!(written(reporter), "Error running command: empty command\n");
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_keeps_exit_code() {
        let mut reporter = ExitReporter::new(BrokenPipe);
        let report = reporter.report(&TerminationOutcome::TimedOut {
            timeout: TimeoutPolicy::new(Duration::from_millis(500)),
            status: None,
            kill_error: None,
        });

        assert_eq!(report.exit_code, TIMEOUT_EXIT_CODE);
        assert_eq!(
            report.diagnostic.as_deref(),
            Some("Killing command due to timeout (500ms)")
        );
    }
}
