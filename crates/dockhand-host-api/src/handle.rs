//! Process exit status and lifecycle state

/// Exit status of a child process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus {
    /// Exit code if the process exited normally
    pub code: Option<i32>,

    /// Signal number if the process was killed by a signal (Unix)
    pub signal: Option<i32>,
}

impl ExitStatus {
    pub fn success() -> Self {
        Self {
            code: Some(0),
            signal: None,
        }
    }

    pub fn with_code(code: i32) -> Self {
        Self {
            code: Some(code),
            signal: None,
        }
    }

    pub fn signaled(signal: i32) -> Self {
        Self {
            code: None,
            signal: Some(signal),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit code to hand back to the operating environment.
    ///
    /// Signal deaths follow the shell convention of `128 + signal`.
    pub fn exit_code(&self) -> i32 {
        match (self.code, self.signal) {
            (Some(code), _) => code,
            (None, Some(signal)) => 128 + signal,
            (None, None) => 1,
        }
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ExitStatus::with_code(code);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(sig) = status.signal() {
                return ExitStatus::signaled(sig);
            }
        }

        ExitStatus {
            code: None,
            signal: None,
        }
    }
}

/// Lifecycle of one supervised process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Prepared but not spawned yet
    NotStarted,

    /// Spawned and not yet reaped
    Running,

    /// Exited on its own (or from a signal the supervisor did not send)
    Exited(ExitStatus),

    /// The supervisor sent its termination; `status` is set once reaped
    Killed { status: Option<ExitStatus> },
}

impl ProcessState {
    /// Final status, if the process has been reaped
    pub fn status(&self) -> Option<ExitStatus> {
        match self {
            ProcessState::Exited(status) => Some(*status),
            ProcessState::Killed { status } => *status,
            ProcessState::NotStarted | ProcessState::Running => None,
        }
    }

    /// Whether a termination signal may still be sent
    pub fn can_terminate(&self) -> bool {
        matches!(self, ProcessState::Running)
    }

    /// Record a reaped status, keeping the `Killed` marker if one was set
    pub fn reaped(self, status: ExitStatus) -> ProcessState {
        match self {
            ProcessState::Killed { .. } => ProcessState::Killed {
                status: Some(status),
            },
            _ => ProcessState::Exited(status),
        }
    }
}
