//! Command supervision core for dockhand
//!
//! This crate is the heart of dockhand, containing:
//! - Timeout policy (zero disables enforcement)
//! - Timeout guard state machine (Idle -> Armed -> Fired | Disarmed)
//! - The single termination outcome of an invocation
//! - Exit reporting (exit code + diagnostic on stderr)

mod guard;
mod outcome;
mod policy;
mod reporter;
mod supervisor;

pub use guard::*;
pub use outcome::*;
pub use policy::*;
pub use reporter::*;
pub use supervisor::*;
