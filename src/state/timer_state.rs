//! Timer definitions and per-timer runtime state

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a timer, never reused once issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable countdown definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timer {
    pub id: TimerId,
    pub name: String,
    pub duration_seconds: u64,
    pub category: String,
}

/// Lifecycle status of a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerStatus {
    Pending,
    Running,
    Paused,
    Completed,
}

impl fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TimerStatus::Pending => "pending",
            TimerStatus::Running => "running",
            TimerStatus::Paused => "paused",
            TimerStatus::Completed => "completed",
        };
        f.write_str(label)
    }
}

/// Mutable execution state paired with exactly one timer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerRuntimeState {
    pub time_left_seconds: u64,
    pub running: bool,
    pub status: TimerStatus,
}

impl TimerRuntimeState {
    /// Create the initial state for a freshly added timer
    pub fn pending(duration_seconds: u64) -> Self {
        Self {
            time_left_seconds: duration_seconds,
            running: false,
            status: TimerStatus::Pending,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_completed(&self) -> bool {
        self.status == TimerStatus::Completed
    }

    /// Move to `Running`. Returns false when the state was left untouched.
    pub(crate) fn start(&mut self) -> bool {
        match self.status {
            TimerStatus::Pending | TimerStatus::Paused => {
                self.status = TimerStatus::Running;
                self.running = true;
                true
            }
            TimerStatus::Running | TimerStatus::Completed => false,
        }
    }

    /// Move `Running` to `Paused`. Returns false for any other status.
    pub(crate) fn pause(&mut self) -> bool {
        if self.status != TimerStatus::Running {
            return false;
        }
        self.status = TimerStatus::Paused;
        self.running = false;
        true
    }

    pub(crate) fn reset(&mut self, duration_seconds: u64) {
        *self = Self::pending(duration_seconds);
    }

    /// Force completion. Returns false if already completed.
    pub(crate) fn complete(&mut self) -> bool {
        if self.is_completed() {
            return false;
        }
        self.status = TimerStatus::Completed;
        self.running = false;
        self.time_left_seconds = 0;
        true
    }

    /// Advance a running timer by one second.
    ///
    /// Returns true when this step brought the timer to zero and completed it.
    pub(crate) fn advance(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.time_left_seconds = self.time_left_seconds.saturating_sub(1);
        if self.time_left_seconds == 0 {
            self.complete();
            return true;
        }
        false
    }

    /// Fraction of the configured duration still remaining, in `[0, 1]`
    pub fn progress(&self, duration_seconds: u64) -> f64 {
        if duration_seconds == 0 {
            return 0.0;
        }
        (self.time_left_seconds as f64 / duration_seconds as f64).clamp(0.0, 1.0)
    }
}

/// Render a second count as `HH:MM:SS`
pub fn format_hms(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}
