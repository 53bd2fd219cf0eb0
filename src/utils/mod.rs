//! Process-level helpers
//!
//! Shutdown signal handling used by the `run` command.

pub mod signals;

pub use signals::shutdown_signal;
