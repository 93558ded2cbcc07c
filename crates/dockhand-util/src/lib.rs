//! Shared utilities for dockhand
//!
//! This crate provides:
//! - Duration parsing and rendering in Go notation (`1s`, `500ms`, `1m30s`)
//! - Time utilities (monotonic time, wall-clock formatting)
//! - Error types

mod error;
mod time;

pub use error::*;
pub use time::*;
