//! Host process capability interfaces for dockhand
//!
//! This crate defines the capability-based interface between the supervisor
//! core and platform-specific process control. It contains no platform code
//! itself.

mod capabilities;
mod command;
mod handle;
mod mock;
mod traits;

pub use capabilities::*;
pub use command::*;
pub use handle::*;
pub use mock::*;
pub use traits::*;
