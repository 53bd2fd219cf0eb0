//! Timer Deck - categorised countdown timers driven by a shared clock
//!
//! This library provides the timer state engine: a registry of timer
//! definitions, their runtime state machine, a completion history, bulk
//! category operations and best-effort persistence of all of it.

pub mod config;
pub mod error;
pub mod state;
pub mod services;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{EngineError, Result};
pub use services::SnapshotStore;
pub use state::{
    CompletionRecord, Snapshot, Timer, TimerEngine, TimerEvent, TimerId, TimerRuntimeState,
    TimerStatus,
};
pub use tasks::{spawn_clock, spawn_persistence_writer, ClockHandle, PersistenceHandle};
pub use utils::signals::shutdown_signal;
