//! Host capabilities model

/// Describes what a launcher can do with the processes it starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCapabilities {
    /// Can forcefully kill processes
    pub can_kill_forcefully: bool,

    /// Can group process trees (process groups, job objects)
    pub can_group_process_tree: bool,

    /// Can relay operator signals to the child
    pub can_forward_signals: bool,
}

impl HostCapabilities {
    /// Create minimal capabilities (process spawn/kill only)
    pub fn minimal() -> Self {
        Self {
            can_kill_forcefully: true,
            can_group_process_tree: false,
            can_forward_signals: false,
        }
    }

    /// Create capabilities for a Unix host with POSIX signals
    pub fn unix_full() -> Self {
        Self {
            can_kill_forcefully: true,
            can_group_process_tree: true,
            can_forward_signals: true,
        }
    }
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self::minimal()
    }
}
