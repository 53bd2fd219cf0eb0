//! The timer state machine over all three stores
//!
//! `EngineState` is plain data with no locking. `TimerEngine` wraps it behind a
//! single lock so that every operation here is applied atomically.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};
use super::{
    CompletionRecord, HistoryLog, RuntimeStore, Snapshot, Timer, TimerEvent, TimerId,
    TimerRegistry, TimerRuntimeState, TimerStatus,
};

#[derive(Debug, Clone, Default)]
pub struct EngineState {
    registry: TimerRegistry,
    runtime: RuntimeStore,
    history: HistoryLog,
    events: Vec<TimerEvent>,
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild engine state from a loaded snapshot, repairing anything that breaks
    /// the pairing between timers and runtime states.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let Snapshot {
            next_id,
            timers,
            runtime_states,
            history,
        } = snapshot;

        let mut seen = HashSet::new();
        let timers: Vec<Timer> = timers
            .into_iter()
            .filter(|timer| {
                let first = seen.insert(timer.id);
                if !first {
                    warn!("Dropping timer '{}' with duplicate id {}", timer.name, timer.id);
                }
                first
            })
            .collect();

        let registry = TimerRegistry::from_parts(next_id, timers);
        let mut runtime = RuntimeStore::from_states(runtime_states);

        let orphans: Vec<TimerId> = runtime
            .states()
            .keys()
            .filter(|id| !registry.contains(**id))
            .copied()
            .collect();
        for id in orphans {
            warn!("Dropping runtime state for unknown timer {}", id);
            runtime.remove(id);
        }

        for timer in registry.timers() {
            match runtime.get_mut(timer.id) {
                Some(state) => {
                    if normalize(state, timer.duration_seconds) {
                        warn!("Repaired inconsistent runtime state for timer {}", timer.id);
                    }
                }
                None => {
                    warn!("Timer {} had no runtime state, recreating as pending", timer.id);
                    runtime.insert(timer.id, TimerRuntimeState::pending(timer.duration_seconds));
                }
            }
        }

        Self {
            registry,
            runtime,
            history: HistoryLog::from_records(history),
            events: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            next_id: self.registry.next_id(),
            timers: self.registry.timers().to_vec(),
            runtime_states: self.runtime.states().clone(),
            history: self.history.list().to_vec(),
        }
    }

    pub fn registry(&self) -> &TimerRegistry {
        &self.registry
    }

    pub fn runtime(&self) -> &RuntimeStore {
        &self.runtime
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn runtime_state(&self, id: TimerId) -> Option<&TimerRuntimeState> {
        self.runtime.get(id)
    }

    /// Take the events produced since the last call
    pub fn drain_events(&mut self) -> Vec<TimerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Register a timer together with its pending runtime state
    pub fn add(&mut self, name: &str, duration_seconds: u64, category: &str) -> Result<Timer> {
        let timer = self.registry.add(name, duration_seconds, category)?;
        self.runtime
            .insert(timer.id, TimerRuntimeState::pending(timer.duration_seconds));
        info!(
            "Added timer {} '{}' ({}s) in '{}'",
            timer.id, timer.name, timer.duration_seconds, timer.category
        );
        self.events.push(TimerEvent::Added(timer.clone()));
        Ok(timer)
    }

    pub fn start(&mut self, id: TimerId) -> Result<TimerRuntimeState> {
        let state = self.runtime.get_mut(id).ok_or(EngineError::UnknownTimer(id))?;
        if state.start() {
            debug!("Timer {} started", id);
            self.events.push(TimerEvent::Started(id));
        } else {
            debug!("Timer {} not started, status is {}", id, state.status);
        }
        Ok(state.clone())
    }

    pub fn pause(&mut self, id: TimerId) -> Result<TimerRuntimeState> {
        let state = self.runtime.get_mut(id).ok_or(EngineError::UnknownTimer(id))?;
        if state.pause() {
            debug!("Timer {} paused", id);
            self.events.push(TimerEvent::Paused(id));
        }
        Ok(state.clone())
    }

    /// Reset to pending. Unknown ids are tolerated and yield `None`.
    pub fn reset(&mut self, id: TimerId) -> Option<TimerRuntimeState> {
        let Some(timer) = self.registry.get(id) else {
            debug!("Ignoring reset of unknown timer {}", id);
            return None;
        };
        let state = self.runtime.get_mut(id)?;
        state.reset(timer.duration_seconds);
        debug!("Timer {} reset to {}s", id, timer.duration_seconds);
        self.events.push(TimerEvent::Reset(id));
        Some(state.clone())
    }

    /// Force completion outside the clock.
    ///
    /// Returns the appended record, or `None` when the timer was already completed.
    pub fn complete(
        &mut self,
        id: TimerId,
        now: DateTime<Utc>,
    ) -> Result<Option<CompletionRecord>> {
        let timer = self.registry.get(id).ok_or(EngineError::UnknownTimer(id))?;
        let state = self.runtime.get_mut(id).ok_or(EngineError::UnknownTimer(id))?;
        if !state.complete() {
            debug!("Timer {} already completed", id);
            return Ok(None);
        }

        let record = CompletionRecord::for_timer(timer, now);
        info!("Timer {} '{}' completed manually", id, timer.name);
        self.history.append(record.clone());
        self.events.push(TimerEvent::Completed {
            id,
            record: record.clone(),
        });
        Ok(Some(record))
    }

    /// Advance every running timer by one second.
    ///
    /// Each running timer is decremented exactly once; timers that reach zero
    /// complete in the same pass. Returns the number of completions.
    pub fn tick(&mut self, now: DateTime<Utc>) -> usize {
        let mut completed = 0;
        for (id, state) in self.runtime.iter_mut() {
            if !state.is_running() {
                continue;
            }
            let Some(timer) = self.registry.get(*id) else {
                continue;
            };

            if state.advance() {
                let record = CompletionRecord::for_timer(timer, now);
                info!("Timer {} '{}' finished", id, timer.name);
                self.history.append(record.clone());
                self.events.push(TimerEvent::Completed { id: *id, record });
                completed += 1;
            } else if state.time_left_seconds == timer.duration_seconds / 2 {
                debug!("Timer {} '{}' is halfway", id, timer.name);
                self.events.push(TimerEvent::Halfway {
                    id: *id,
                    name: timer.name.clone(),
                });
            }
        }
        completed
    }

    /// Start every timer in `category`. Returns how many timers matched.
    pub fn start_all(&mut self, category: &str) -> usize {
        self.apply_to_category(category, |state, _| state.start(), TimerEvent::Started)
    }

    pub fn pause_all(&mut self, category: &str) -> usize {
        self.apply_to_category(category, |state, _| state.pause(), TimerEvent::Paused)
    }

    /// Restart paused timers in `category`; pending and completed timers are left alone.
    pub fn resume_all(&mut self, category: &str) -> usize {
        self.apply_to_category(
            category,
            |state, _| state.status == TimerStatus::Paused && state.start(),
            TimerEvent::Started,
        )
    }

    pub fn reset_all(&mut self, category: &str) -> usize {
        self.apply_to_category(
            category,
            |state, timer| {
                state.reset(timer.duration_seconds);
                true
            },
            TimerEvent::Reset,
        )
    }

    fn apply_to_category<F>(
        &mut self,
        category: &str,
        mut transition: F,
        event: fn(TimerId) -> TimerEvent,
    ) -> usize
    where
        F: FnMut(&mut TimerRuntimeState, &Timer) -> bool,
    {
        let mut matched = 0;
        for timer in self.registry.in_category(category) {
            matched += 1;
            if let Some(state) = self.runtime.get_mut(timer.id) {
                if transition(state, timer) {
                    self.events.push(event(timer.id));
                }
            }
        }
        debug!("Category '{}' operation matched {} timers", category, matched);
        matched
    }

    /// Remove all timers and runtime states. History is kept.
    pub fn clear(&mut self) {
        info!("Clearing {} timers", self.registry.len());
        self.registry.clear();
        self.runtime.clear();
        self.events.push(TimerEvent::Cleared);
    }
}

/// Restore runtime-state invariants. Returns true if anything changed.
fn normalize(state: &mut TimerRuntimeState, duration_seconds: u64) -> bool {
    let before = state.clone();
    state.time_left_seconds = state.time_left_seconds.min(duration_seconds);
    match state.status {
        TimerStatus::Completed => {
            state.running = false;
            state.time_left_seconds = 0;
        }
        TimerStatus::Running => state.running = true,
        TimerStatus::Pending | TimerStatus::Paused => state.running = false,
    }
    if state.time_left_seconds == 0 && state.status != TimerStatus::Completed {
        state.status = TimerStatus::Completed;
        state.running = false;
    }
    *state != before
}
