//! Background tasks module
//!
//! This module contains the tasks that run alongside callers of the engine:
//! the clock that ticks timers and the writer that persists snapshots.

pub mod clock;
pub mod persistence_writer;

// Re-export main functions
pub use clock::{clock_task, spawn_clock, ClockHandle, TICK_PERIOD};
pub use persistence_writer::{
    persistence_writer_task, spawn_persistence_writer, PersistCommand, PersistenceHandle,
};
