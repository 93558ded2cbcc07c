//! Command supervisor

use dockhand_host_api::{
    CommandLauncher, CommandLine, LaunchOptions, ProcessHandle, effective_options,
};
use std::io::Write;
use tracing::{error, info, warn};

use crate::{
    ExitReporter, Report, SignalReceiver, TerminationOutcome, TimeoutGuard, TimeoutPolicy,
};

/// Supervises one command per invocation
pub struct Supervisor<L: CommandLauncher> {
    launcher: L,
    options: LaunchOptions,
}

impl<L: CommandLauncher> Supervisor<L> {
    pub fn new(launcher: L) -> Self {
        Self {
            launcher,
            options: LaunchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: LaunchOptions) -> Self {
        self.options = options;
        self
    }

    /// Launch `command` and supervise it to a single outcome.
    ///
    /// A launch failure returns immediately; no timer is armed.
    pub async fn run(
        &self,
        command: &CommandLine,
        policy: TimeoutPolicy,
        signals: Option<SignalReceiver>,
    ) -> TerminationOutcome {
        let caps = self.launcher.capabilities();
        let options = effective_options(caps, self.options);

        let mut signals = match signals {
            Some(_) if !caps.can_forward_signals => {
                warn!("Signal relay not supported by this host");
                None
            }
            other => other,
        };

        if policy.is_enabled() && !caps.can_kill_forcefully {
            warn!(
                timeout = %policy,
                "Host cannot kill processes, timeout kill may not take effect"
            );
        }

        let mut handle = match self.launcher.launch(command, &options) {
            Ok(handle) => handle,
            Err(e) => {
                error!(command = %command, error = %e, "Failed to launch command");
                return TerminationOutcome::LaunchFailed(e);
            }
        };

        info!(
            pid = ?handle.pid(),
            command = %command,
            timeout = %policy,
            timeout_enabled = policy.is_enabled(),
            "Command started"
        );

        let mut guard = TimeoutGuard::new(policy);
        let outcome = guard.supervise(&mut handle, &mut signals).await;

        match &outcome {
            TerminationOutcome::NormalExit(status) if status.is_success() => {
                info!("Command finished successfully")
            }
            TerminationOutcome::NormalExit(status) => {
                info!(status = ?status, "Command exited with error")
            }
            TerminationOutcome::TimedOut { status, kill_error, .. } => {
                info!(
                    timeout = %guard.policy(),
                    status = ?status,
                    kill_error = ?kill_error,
                    "Command timed out"
                )
            }
            TerminationOutcome::LaunchFailed(_) | TerminationOutcome::WaitFailed(_) => {}
        }

        outcome
    }

    /// Run and report: the diagnostic is written before the exit code is returned
    pub async fn execute<W: Write>(
        &self,
        command: &CommandLine,
        policy: TimeoutPolicy,
        signals: Option<SignalReceiver>,
        reporter: &mut ExitReporter<W>,
    ) -> Report {
        let outcome = self.run(command, policy, signals).await;
        reporter.report(&outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LAUNCH_FAILED_EXIT_CODE, TIMEOUT_EXIT_CODE};
    use dockhand_host_api::{
        ExitStatus, ForwardedSignal, HostCapabilities, HostError, MockLauncher, MockScript,
    };
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn launch_failure_starts_no_timer() {
        let launcher = MockLauncher::new(MockScript::runs_forever());
        *launcher.fail_start.lock().unwrap() = true;
        let stats = launcher.stats();

        let supervisor = Supervisor::new(launcher);
        let outcome = supervisor
            .run(
                &CommandLine::new("missing"),
                TimeoutPolicy::new(Duration::from_secs(1)),
                None,
            )
            .await;

        assert!(matches!(outcome, TerminationOutcome::LaunchFailed(HostError::SpawnFailed { .. })));
        assert_eq!(stats.launches(), 0);
        assert_eq!(stats.terminate_calls(), 0);
    }

    #[tokio::test]
    async fn execute_reports_timeout() {
        let supervisor = Supervisor::new(MockLauncher::new(MockScript::runs_forever()));
        let mut reporter = ExitReporter::new(Vec::new());

        let report = supervisor
            .execute(
                &CommandLine::new("sleep").arg("10"),
                TimeoutPolicy::new(Duration::from_millis(30)),
                None,
                &mut reporter,
            )
            .await;

        assert_eq!(report.exit_code, TIMEOUT_EXIT_CODE);
        let err = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(err.matches("Killing command due to timeout").count(), 1);
        assert!(err.contains("30ms"));
    }

    #[tokio::test]
    async fn execute_passes_exit_code_through() {
        let supervisor = Supervisor::new(MockLauncher::new(MockScript::exits_after(
            Duration::from_millis(10),
            ExitStatus::with_code(42),
        )));
        let mut reporter = ExitReporter::new(Vec::new());

        let report = supervisor
            .execute(
                &CommandLine::new("child"),
                TimeoutPolicy::new(Duration::from_secs(5)),
                None,
                &mut reporter,
            )
            .await;

        assert_eq!(report.exit_code, 42);
        assert!(reporter.into_inner().is_empty());
    }

    #[tokio::test]
    async fn execute_reports_launch_failure() {
        let supervisor = Supervisor::new(MockLauncher::default());
        let mut reporter = ExitReporter::new(Vec::new());

        let report = supervisor
            .execute(&CommandLine::new(""), TimeoutPolicy::disabled(), None, &mut reporter)
            .await;

        assert_eq!(report.exit_code, LAUNCH_FAILED_EXIT_CODE);
        assert_eq!(
            String::from_utf8(reporter.into_inner()).unwrap(),
            "Error running command: empty command\n"
        );
    }

    #[tokio::test]
    async fn signals_dropped_without_capability() {
        let mut script = MockScript::exits_after(Duration::from_millis(50), ExitStatus::success());
        script.exit_on_signal = true;
        let launcher = MockLauncher::new(script);
        let stats = launcher.stats();

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(ForwardedSignal::Interrupt).unwrap();

        let supervisor = Supervisor::new(launcher);
        let outcome = supervisor
            .run(&CommandLine::new("child"), TimeoutPolicy::disabled(), Some(rx))
            .await;

        assert!(matches!(outcome, TerminationOutcome::NormalExit(s) if s.is_success()));
        assert!(stats.forwarded().is_empty());
    }

    #[tokio::test]
    async fn signals_relayed_with_capability() {
        let mut script = MockScript::runs_forever();
        script.exit_on_signal = true;
        let launcher = MockLauncher::new(script).with_capabilities(HostCapabilities::unix_full());
        let stats = launcher.stats();

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(ForwardedSignal::Interrupt).unwrap();

        let supervisor =
            Supervisor::new(launcher).with_options(LaunchOptions { process_group: true });
        let outcome = supervisor
            .run(&CommandLine::new("child"), TimeoutPolicy::disabled(), Some(rx))
            .await;

        assert_eq!(outcome.exit_code(), 130);
        assert_eq!(stats.forwarded(), vec![ForwardedSignal::Interrupt]);
        assert_eq!(stats.kills_sent(), 0);
    }
}
