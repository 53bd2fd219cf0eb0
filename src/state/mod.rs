//! State management module
//!
//! This module contains the timer stores, the state machine over them and the
//! engine handle that serialises access to it.

pub mod app_state;
pub mod engine_state;
pub mod events;
pub mod history;
pub mod registry;
pub mod runtime;
pub mod snapshot;
pub mod timer_state;

// Re-export main types
pub use app_state::TimerEngine;
pub use engine_state::EngineState;
pub use events::TimerEvent;
pub use history::{CompletionRecord, HistoryLog};
pub use registry::TimerRegistry;
pub use runtime::RuntimeStore;
pub use snapshot::Snapshot;
pub use timer_state::{format_hms, Timer, TimerId, TimerRuntimeState, TimerStatus};
