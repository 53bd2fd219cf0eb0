//! Engine handle that serialises every operation on the timer state

use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use crate::{
    error::{EngineError, Result},
    tasks::PersistenceHandle,
};
use super::{
    CompletionRecord, EngineState, Snapshot, Timer, TimerEvent, TimerId, TimerRuntimeState,
};

/// How a mutation is written to durable storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Persist {
    Save,
    PurgeThenSave,
}

/// Timer engine shared between callers and the clock.
///
/// All mutations go through one lock. After each mutation the new snapshot is
/// published, queued for saving and the resulting events are broadcast, all
/// before the lock is released so observers see changes in order.
#[derive(Debug)]
pub struct TimerEngine {
    state: Mutex<EngineState>,
    persistence: PersistenceHandle,
    /// Latest published snapshot
    snapshot_tx: watch::Sender<Snapshot>,
    /// Keep the receiver alive to prevent channel closure
    _snapshot_rx: watch::Receiver<Snapshot>,
    /// Channel for timer events
    event_tx: broadcast::Sender<TimerEvent>,
}

impl TimerEngine {
    /// Create an engine from a loaded snapshot
    pub fn new(snapshot: Snapshot, persistence: PersistenceHandle) -> Self {
        let state = EngineState::from_snapshot(snapshot);
        let (snapshot_tx, snapshot_rx) = watch::channel(state.snapshot());
        let (event_tx, _) = broadcast::channel(256);

        Self {
            state: Mutex::new(state),
            persistence,
            snapshot_tx,
            _snapshot_rx: snapshot_rx,
            event_tx,
        }
    }

    /// An empty engine that never touches durable storage
    pub fn in_memory() -> Self {
        Self::new(Snapshot::default(), PersistenceHandle::disabled())
    }

    fn lock(&self) -> Result<MutexGuard<'_, EngineState>> {
        self.state
            .lock()
            .map_err(|e| EngineError::StatePoisoned(format!("Failed to lock engine state: {}", e)))
    }

    /// Apply `updater` under the lock, then publish, persist and notify
    fn update<T, F>(&self, action: &str, persist: Persist, updater: F) -> Result<T>
    where
        F: FnOnce(&mut EngineState) -> Result<T>,
    {
        let mut state = self.lock()?;
        let value = updater(&mut state)?;

        let snapshot = state.snapshot();
        let events = state.drain_events();

        if persist == Persist::PurgeThenSave {
            self.persistence.purge();
        }
        self.persistence.save(snapshot.clone());
        self.snapshot_tx.send_replace(snapshot);

        for event in events {
            if self.event_tx.send(event).is_err() {
                debug!("No event subscribers for {}", action);
            }
        }

        debug!("Applied {}", action);
        Ok(value)
    }

    fn read<T>(&self, reader: impl FnOnce(&EngineState) -> T) -> Result<T> {
        let state = self.lock()?;
        Ok(reader(&state))
    }

    pub fn add_timer(&self, name: &str, duration_seconds: u64, category: &str) -> Result<Timer> {
        self.update("add", Persist::Save, |state| state.add(name, duration_seconds, category))
    }

    pub fn start_timer(&self, id: TimerId) -> Result<TimerRuntimeState> {
        self.update("start", Persist::Save, |state| state.start(id))
    }

    pub fn pause_timer(&self, id: TimerId) -> Result<TimerRuntimeState> {
        self.update("pause", Persist::Save, |state| state.pause(id))
    }

    /// Reset a timer to pending. Unknown ids are not an error and return `None`.
    pub fn reset_timer(&self, id: TimerId) -> Result<Option<TimerRuntimeState>> {
        self.update("reset", Persist::Save, |state| Ok(state.reset(id)))
    }

    /// Complete a timer immediately, returning the new record if one was written
    pub fn complete_timer(&self, id: TimerId) -> Result<Option<CompletionRecord>> {
        let now = Utc::now();
        self.update("complete", Persist::Save, |state| state.complete(id, now))
    }

    /// Advance all running timers by one second, timestamped now
    pub fn tick(&self) -> Result<usize> {
        self.tick_at(Utc::now())
    }

    /// Advance all running timers by one second with an explicit timestamp
    pub fn tick_at(&self, now: DateTime<Utc>) -> Result<usize> {
        self.update("tick", Persist::Save, |state| Ok(state.tick(now)))
    }

    pub fn start_all_category_timers(&self, category: &str) -> Result<usize> {
        self.update("start-all", Persist::Save, |state| Ok(state.start_all(category)))
    }

    pub fn pause_all_category_timers(&self, category: &str) -> Result<usize> {
        self.update("pause-all", Persist::Save, |state| Ok(state.pause_all(category)))
    }

    pub fn resume_all_category_timers(&self, category: &str) -> Result<usize> {
        self.update("resume-all", Persist::Save, |state| Ok(state.resume_all(category)))
    }

    pub fn reset_all_category_timers(&self, category: &str) -> Result<usize> {
        self.update("reset-all", Persist::Save, |state| Ok(state.reset_all(category)))
    }

    /// Remove every timer and delete the saved snapshot. History is kept and re-saved.
    pub fn clear_all(&self) -> Result<()> {
        info!("Clearing all timers");
        self.update("clear", Persist::PurgeThenSave, |state| {
            state.clear();
            Ok(())
        })
    }

    pub fn timers(&self) -> Result<Vec<Timer>> {
        self.read(|state| state.registry().timers().to_vec())
    }

    pub fn timers_by_category(&self) -> Result<IndexMap<String, Vec<Timer>>> {
        self.read(|state| state.registry().by_category())
    }

    pub fn runtime_states(&self) -> Result<BTreeMap<TimerId, TimerRuntimeState>> {
        self.read(|state| state.runtime().states().clone())
    }

    pub fn runtime_state(&self, id: TimerId) -> Result<Option<TimerRuntimeState>> {
        self.read(|state| state.runtime_state(id).cloned())
    }

    pub fn history(&self) -> Result<Vec<CompletionRecord>> {
        self.read(|state| state.history().list().to_vec())
    }

    /// Consistent copy of the whole state
    pub fn snapshot(&self) -> Result<Snapshot> {
        self.read(|state| state.snapshot())
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<TimerEvent> {
        self.event_tx.subscribe()
    }

    /// Receiver that always holds the snapshot published by the latest mutation
    pub fn subscribe_snapshots(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_tx.subscribe()
    }
}
