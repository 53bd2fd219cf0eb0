//! Runtime state store keyed by timer id

use std::collections::BTreeMap;

use super::{TimerId, TimerRuntimeState};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeStore {
    states: BTreeMap<TimerId, TimerRuntimeState>,
}

impl RuntimeStore {
    pub fn from_states(states: BTreeMap<TimerId, TimerRuntimeState>) -> Self {
        Self { states }
    }

    pub(crate) fn insert(&mut self, id: TimerId, state: TimerRuntimeState) {
        self.states.insert(id, state);
    }

    pub fn get(&self, id: TimerId) -> Option<&TimerRuntimeState> {
        self.states.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TimerId) -> Option<&mut TimerRuntimeState> {
        self.states.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: TimerId) -> Option<TimerRuntimeState> {
        self.states.remove(&id)
    }

    pub fn states(&self) -> &BTreeMap<TimerId, TimerRuntimeState> {
        &self.states
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&TimerId, &mut TimerRuntimeState)> {
        self.states.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.states.clear();
    }
}
