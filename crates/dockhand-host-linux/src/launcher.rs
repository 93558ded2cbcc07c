//! Unix command launcher

use dockhand_host_api::{
    CommandLauncher, CommandLine, HostCapabilities, HostResult, LaunchOptions,
};
use tracing::info;

use crate::process::ManagedProcess;

/// Launches commands as direct children with inherited stdio
pub struct UnixLauncher {
    capabilities: HostCapabilities,
}

impl UnixLauncher {
    pub fn new() -> Self {
        Self {
            capabilities: HostCapabilities::unix_full(),
        }
    }
}

impl Default for UnixLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandLauncher for UnixLauncher {
    type Handle = ManagedProcess;

    fn capabilities(&self) -> &HostCapabilities {
        &self.capabilities
    }

    fn prepare(
        &self,
        command: &CommandLine,
        options: &LaunchOptions,
    ) -> HostResult<ManagedProcess> {
        info!(command = %command, process_group = options.process_group, "Preparing command");
        ManagedProcess::new(command, options)
    }
}
