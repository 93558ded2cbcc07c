//! Termination outcome of one invocation

use dockhand_host_api::{ExitStatus, HostError};

use crate::TimeoutPolicy;

/// Exit code when the supervisor killed the child for running too long
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Exit code when the child could not be started
pub const LAUNCH_FAILED_EXIT_CODE: i32 = 127;

/// Exit code when the child's exit could not be observed
pub const WAIT_FAILED_EXIT_CODE: i32 = 1;

/// Phrase callers match on to detect a timeout kill
pub const TIMEOUT_DIAGNOSTIC: &str = "Killing command due to timeout";

/// The single resolved result of supervising a command
#[derive(Debug)]
pub enum TerminationOutcome {
    /// Child ran to completion on its own
    NormalExit(ExitStatus),

    /// The timer fired first and the supervisor killed the child
    TimedOut {
        timeout: TimeoutPolicy,
        /// Post-kill status, if the child was reaped
        status: Option<ExitStatus>,
        /// Set when the kill signal could not be delivered
        kill_error: Option<String>,
    },

    /// Child could not be started; no timer ran
    LaunchFailed(HostError),

    /// Waiting on the started child failed
    WaitFailed(HostError),
}

impl TerminationOutcome {
    /// Exit code to hand back to the operating environment
    pub fn exit_code(&self) -> i32 {
        match self {
            TerminationOutcome::NormalExit(status) => status.exit_code(),
            TerminationOutcome::TimedOut { .. } => TIMEOUT_EXIT_CODE,
            TerminationOutcome::LaunchFailed(_) => LAUNCH_FAILED_EXIT_CODE,
            TerminationOutcome::WaitFailed(_) => WAIT_FAILED_EXIT_CODE,
        }
    }

    /// Line for the error stream, if this outcome has one
    pub fn diagnostic(&self) -> Option<String> {
        match self {
            TerminationOutcome::NormalExit(_) => None,
            TerminationOutcome::TimedOut { timeout, .. } => {
                Some(format!("{} ({})", TIMEOUT_DIAGNOSTIC, timeout))
            }
            TerminationOutcome::LaunchFailed(err) => {
                Some(format!("Error running command: {}", err))
            }
            TerminationOutcome::WaitFailed(err) => {
                Some(format!("Error waiting for command: {}", err))
            }
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TerminationOutcome::TimedOut { .. })
    }
}
