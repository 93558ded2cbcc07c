//! Host process traits

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    CommandLine, ExitStatus, ForwardedSignal, HostCapabilities, LaunchOptions, ProcessState,
};

/// Errors from host process operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("empty command")]
    EmptyCommand,

    #[error("{program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("process already started")]
    AlreadyStarted,

    #[error("process not started")]
    NotStarted,

    #[error("Signal failed: {0}")]
    SignalFailed(String),

    #[error("Wait failed: {0}")]
    WaitFailed(#[source] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// Ownership wrapper around one OS process.
///
/// The supervisor holds the only handle; nothing else waits on or signals
/// the process.
#[async_trait]
pub trait ProcessHandle: Send {
    /// Spawn the prepared process, returning its pid
    fn start(&mut self) -> HostResult<u32>;

    fn pid(&self) -> Option<u32>;

    fn state(&self) -> ProcessState;

    /// Suspend until the process exits.
    ///
    /// Must be cancel-safe: dropping the future and calling again later
    /// observes the same exit.
    async fn wait(&mut self) -> HostResult<ExitStatus>;

    /// Check for exit without suspending
    fn try_wait(&mut self) -> HostResult<Option<ExitStatus>>;

    /// Forcefully kill the process.
    ///
    /// Idempotent: returns `Ok(false)` when nothing was sent because the
    /// process already exited or was already killed.
    fn terminate(&mut self) -> HostResult<bool>;

    /// Relay an operator signal to the process
    fn signal(&mut self, signal: ForwardedSignal) -> HostResult<()>;
}

/// Builds process handles from resolved command lines
pub trait CommandLauncher: Send + Sync {
    type Handle: ProcessHandle;

    /// Get the capabilities of this launcher
    fn capabilities(&self) -> &HostCapabilities;

    /// Build a handle without spawning anything
    fn prepare(&self, command: &CommandLine, options: &LaunchOptions) -> HostResult<Self::Handle>;

    /// Prepare and start in one step
    fn launch(&self, command: &CommandLine, options: &LaunchOptions) -> HostResult<Self::Handle> {
        let mut handle = self.prepare(command, options)?;
        handle.start()?;
        Ok(handle)
    }
}

/// Downgrade options the launcher cannot honor
pub fn effective_options(caps: &HostCapabilities, requested: LaunchOptions) -> LaunchOptions {
    let mut options = requested;
    if options.process_group && !caps.can_group_process_tree {
        tracing::warn!("Process groups not supported by this host, signaling the child only");
        options.process_group = false;
    }
    options
}
