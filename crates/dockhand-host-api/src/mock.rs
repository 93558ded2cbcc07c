//! Mock launcher for testing

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use crate::{
    CommandLauncher, CommandLine, ExitStatus, ForwardedSignal, HostCapabilities, HostError,
    HostResult, LaunchOptions, ProcessHandle, ProcessState,
};

/// How a mock process behaves once started
#[derive(Debug, Clone)]
pub struct MockScript {
    /// Exit on its own after this long; `None` runs until killed
    pub exit_after: Option<Duration>,

    /// Status reported on a natural exit
    pub exit_status: ExitStatus,

    /// Make `terminate()` fail without killing
    pub fail_terminate: bool,

    /// Die from forwarded signals instead of ignoring them
    pub exit_on_signal: bool,
}

impl MockScript {
    pub fn exits_after(delay: Duration, status: ExitStatus) -> Self {
        Self {
            exit_after: Some(delay),
            exit_status: status,
            fail_terminate: false,
            exit_on_signal: false,
        }
    }

    pub fn runs_forever() -> Self {
        Self {
            exit_after: None,
            exit_status: ExitStatus::success(),
            fail_terminate: false,
            exit_on_signal: false,
        }
    }
}

impl Default for MockScript {
    fn default() -> Self {
        Self::exits_after(Duration::ZERO, ExitStatus::success())
    }
}

/// Counters shared between a launcher and the processes it created
#[derive(Debug, Default)]
pub struct MockStats {
    launches: AtomicUsize,
    terminate_calls: AtomicUsize,
    kills_sent: AtomicUsize,
    forwarded: Mutex<Vec<ForwardedSignal>>,
}

impl MockStats {
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn terminate_calls(&self) -> usize {
        self.terminate_calls.load(Ordering::SeqCst)
    }

    /// Kill signals actually delivered
    pub fn kills_sent(&self) -> usize {
        self.kills_sent.load(Ordering::SeqCst)
    }

    pub fn forwarded(&self) -> Vec<ForwardedSignal> {
        self.forwarded.lock().unwrap().clone()
    }
}

/// Mock launcher for unit/integration testing
pub struct MockLauncher {
    capabilities: HostCapabilities,
    script: MockScript,
    next_pid: AtomicU32,
    stats: Arc<MockStats>,

    /// Configure start to fail
    pub fail_start: Arc<Mutex<bool>>,
}

impl MockLauncher {
    pub fn new(script: MockScript) -> Self {
        Self {
            capabilities: HostCapabilities::minimal(),
            script,
            next_pid: AtomicU32::new(1000),
            stats: Arc::new(MockStats::default()),
            fail_start: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_capabilities(mut self, caps: HostCapabilities) -> Self {
        self.capabilities = caps;
        self
    }

    pub fn stats(&self) -> Arc<MockStats> {
        self.stats.clone()
    }
}

impl Default for MockLauncher {
    fn default() -> Self {
        Self::new(MockScript::default())
    }
}

impl CommandLauncher for MockLauncher {
    type Handle = MockProcess;

    fn capabilities(&self) -> &HostCapabilities {
        &self.capabilities
    }

    fn prepare(&self, command: &CommandLine, _options: &LaunchOptions) -> HostResult<MockProcess> {
        if command.program().is_empty() {
            return Err(HostError::EmptyCommand);
        }

        Ok(MockProcess {
            program: command.program().to_string_lossy().into_owned(),
            script: self.script.clone(),
            pid: self.next_pid.fetch_add(1, Ordering::SeqCst),
            state: ProcessState::NotStarted,
            natural_exit_at: None,
            pending: None,
            fail_start: *self.fail_start.lock().unwrap(),
            stats: self.stats.clone(),
        })
    }
}

/// Simulated process driven by a [`MockScript`]
#[derive(Debug)]
pub struct MockProcess {
    program: String,
    script: MockScript,
    pid: u32,
    state: ProcessState,
    natural_exit_at: Option<Instant>,
    /// Death caused by a kill or forwarded signal, not yet reaped
    pending: Option<ExitStatus>,
    fail_start: bool,
    stats: Arc<MockStats>,
}

impl MockProcess {
    fn exited_naturally(&self) -> bool {
        self.natural_exit_at
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    fn reap(&mut self, status: ExitStatus) -> ExitStatus {
        self.state = self.state.reaped(status);
        status
    }
}

#[async_trait]
impl ProcessHandle for MockProcess {
    fn start(&mut self) -> HostResult<u32> {
        if self.state != ProcessState::NotStarted {
            return Err(HostError::AlreadyStarted);
        }
        if self.fail_start {
            return Err(HostError::SpawnFailed {
                program: self.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "mock spawn failure"),
            });
        }

        self.stats.launches.fetch_add(1, Ordering::SeqCst);
        self.natural_exit_at = self.script.exit_after.map(|delay| Instant::now() + delay);
        self.state = ProcessState::Running;
        Ok(self.pid)
    }

    fn pid(&self) -> Option<u32> {
        match self.state {
            ProcessState::NotStarted => None,
            _ => Some(self.pid),
        }
    }

    fn state(&self) -> ProcessState {
        self.state
    }

    async fn wait(&mut self) -> HostResult<ExitStatus> {
        if self.state == ProcessState::NotStarted {
            return Err(HostError::NotStarted);
        }
        if let Some(status) = self.state.status() {
            return Ok(status);
        }
        if let Some(status) = self.pending.take() {
            return Ok(self.reap(status));
        }

        match self.natural_exit_at {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }

        let status = self.script.exit_status;
        Ok(self.reap(status))
    }

    fn try_wait(&mut self) -> HostResult<Option<ExitStatus>> {
        if self.state == ProcessState::NotStarted {
            return Err(HostError::NotStarted);
        }
        if let Some(status) = self.state.status() {
            return Ok(Some(status));
        }
        if let Some(status) = self.pending.take() {
            return Ok(Some(self.reap(status)));
        }
        if self.exited_naturally() {
            let status = self.script.exit_status;
            return Ok(Some(self.reap(status)));
        }
        Ok(None)
    }

    fn terminate(&mut self) -> HostResult<bool> {
        self.stats.terminate_calls.fetch_add(1, Ordering::SeqCst);

        if !self.state.can_terminate() {
            return Ok(false);
        }
        if self.script.fail_terminate {
            return Err(HostError::SignalFailed("mock kill failure".into()));
        }

        self.stats.kills_sent.fetch_add(1, Ordering::SeqCst);
        self.state = ProcessState::Killed { status: None };
        if self.pending.is_none() && !self.exited_naturally() {
            self.pending = Some(ExitStatus::signaled(9));
        }
        Ok(true)
    }

    fn signal(&mut self, signal: ForwardedSignal) -> HostResult<()> {
        if self.state == ProcessState::NotStarted {
            return Err(HostError::NotStarted);
        }

        self.stats.forwarded.lock().unwrap().push(signal);
        if self.script.exit_on_signal
            && self.state == ProcessState::Running
            && self.pending.is_none()
        {
            self.pending = Some(ExitStatus::signaled(signal.number()));
        }
        Ok(())
    }
}
