//! Unix host for dockhand
//!
//! Provides:
//! - Process spawning with inherited stdio and optional process group isolation
//! - Forceful (SIGKILL) termination, sent at most once
//! - Relaying operator signals to the child
//! - Exit observation

mod launcher;
mod process;

pub use launcher::*;
pub use process::*;
