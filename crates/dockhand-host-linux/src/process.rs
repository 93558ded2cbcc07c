//! Process management utilities

use async_trait::async_trait;
use chrono::{DateTime, Local};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use dockhand_host_api::{
    CommandLine, ExitStatus, ForwardedSignal, HostError, HostResult, LaunchOptions,
    ProcessHandle, ProcessState,
};
use dockhand_util::{MonotonicInstant, format_datetime_full, now};

/// Managed child process, optionally leading its own process group
pub struct ManagedProcess {
    program: String,
    command: Option<Command>,
    child: Option<Child>,
    pid: Option<u32>,
    process_group: bool,
    state: ProcessState,
    started_at: Option<DateTime<Local>>,
    started_at_mono: Option<MonotonicInstant>,
}

impl ManagedProcess {
    /// Prepare a process whose stdio is inherited from the supervisor
    pub fn new(command: &CommandLine, options: &LaunchOptions) -> HostResult<Self> {
        if command.program().is_empty() {
            return Err(HostError::EmptyCommand);
        }

        let mut cmd = Command::new(command.program());
        cmd.args(command.get_args());

        if let Some(dir) = command.cwd() {
            cmd.current_dir(dir);
        }

        cmd.stdin(Stdio::inherit());
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());

        // The child becomes leader of a new group with pgid == pid
        if options.process_group {
            cmd.process_group(0);
        }

        Ok(Self {
            program: command.program().to_string_lossy().into_owned(),
            command: Some(cmd),
            child: None,
            pid: None,
            process_group: options.process_group,
            state: ProcessState::NotStarted,
            started_at: None,
            started_at_mono: None,
        })
    }

    /// Wall-clock start time
    pub fn started_at(&self) -> Option<DateTime<Local>> {
        self.started_at
    }

    fn child_mut(&mut self) -> HostResult<&mut Child> {
        self.child.as_mut().ok_or(HostError::NotStarted)
    }

    fn reap(&mut self, status: ExitStatus) -> ExitStatus {
        self.state = self.state.reaped(status);

        let runtime_ms = self
            .started_at_mono
            .map(|t| t.elapsed().as_millis())
            .unwrap_or_default();
        debug!(
            pid = ?self.pid,
            status = ?status,
            runtime_ms = runtime_ms,
            "Process exited"
        );
        status
    }

    /// Deliver a signal to the child, or to its whole group
    fn send(&self, sig: Signal) -> nix::Result<()> {
        let Some(pid) = self.pid else {
            return Err(nix::errno::Errno::ESRCH);
        };
        let pid = Pid::from_raw(pid as i32);

        if self.process_group {
            signal::killpg(pid, sig)
        } else {
            signal::kill(pid, sig)
        }
    }
}

#[async_trait]
impl ProcessHandle for ManagedProcess {
    fn start(&mut self) -> HostResult<u32> {
        let mut cmd = self.command.take().ok_or(HostError::AlreadyStarted)?;

        let child = cmd.spawn().map_err(|e| HostError::SpawnFailed {
            program: self.program.clone(),
            source: e,
        })?;

        let pid = child
            .id()
            .ok_or_else(|| HostError::Internal("spawned child has no pid".into()))?;

        let started_at = now();
        debug!(
            pid = pid,
            program = %self.program,
            process_group = self.process_group,
            started_at = %format_datetime_full(&started_at),
            "Process spawned"
        );

        self.child = Some(child);
        self.pid = Some(pid);
        self.started_at = Some(started_at);
        self.started_at_mono = Some(MonotonicInstant::now());
        self.state = ProcessState::Running;

        Ok(pid)
    }

    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn state(&self) -> ProcessState {
        self.state
    }

    /// Wait for the process to exit (suspending, cancel-safe)
    async fn wait(&mut self) -> HostResult<ExitStatus> {
        if let Some(status) = self.state.status() {
            return Ok(status);
        }

        let status = self
            .child_mut()?
            .wait()
            .await
            .map_err(HostError::WaitFailed)?;

        Ok(self.reap(status.into()))
    }

    /// Check if the process has exited (non-blocking)
    fn try_wait(&mut self) -> HostResult<Option<ExitStatus>> {
        if let Some(status) = self.state.status() {
            return Ok(Some(status));
        }

        match self.child_mut()?.try_wait() {
            Ok(Some(status)) => Ok(Some(self.reap(status.into()))),
            Ok(None) => Ok(None), // Still running
            Err(e) => Err(HostError::WaitFailed(e)),
        }
    }

    /// Send SIGKILL, at most once
    fn terminate(&mut self) -> HostResult<bool> {
        if !self.state.can_terminate() {
            debug!(pid = ?self.pid, state = ?self.state, "Terminate skipped");
            return Ok(false);
        }

        match self.send(Signal::SIGKILL) {
            Ok(()) => {
                debug!(pid = ?self.pid, group = self.process_group, "Sent SIGKILL");
                self.state = ProcessState::Killed { status: None };
                Ok(true)
            }
            Err(nix::errno::Errno::ESRCH) => {
                // Process already gone
                Ok(false)
            }
            Err(e) => Err(HostError::SignalFailed(format!("Failed to send SIGKILL: {}", e))),
        }
    }

    fn signal(&mut self, forwarded: ForwardedSignal) -> HostResult<()> {
        if self.state != ProcessState::Running {
            debug!(signal = %forwarded, state = ?self.state, "Not relaying signal");
            return Ok(());
        }

        let sig = match forwarded {
            ForwardedSignal::Interrupt => Signal::SIGINT,
            ForwardedSignal::Terminate => Signal::SIGTERM,
            ForwardedSignal::Hangup => Signal::SIGHUP,
            ForwardedSignal::Quit => Signal::SIGQUIT,
        };

        match self.send(sig) {
            Ok(()) => {
                debug!(pid = ?self.pid, signal = %forwarded, "Relayed signal");
                Ok(())
            }
            Err(nix::errno::Errno::ESRCH) => Ok(()),
            Err(e) => {
                warn!(pid = ?self.pid, signal = %forwarded, error = %e, "Failed to relay signal");
                Err(HostError::SignalFailed(format!(
                    "Failed to send {}: {}",
                    forwarded, e
                )))
            }
        }
    }
}
