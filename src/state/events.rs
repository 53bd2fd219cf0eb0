//! Notifications broadcast after state changes

use super::{CompletionRecord, Timer, TimerId};

/// Something observable happened to one or more timers
#[derive(Debug, Clone, PartialEq)]
pub enum TimerEvent {
    Added(Timer),
    Started(TimerId),
    Paused(TimerId),
    Reset(TimerId),
    /// Remaining time just reached half of the configured duration
    Halfway { id: TimerId, name: String },
    Completed { id: TimerId, record: CompletionRecord },
    Cleared,
}
