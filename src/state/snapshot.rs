//! Durable snapshot of the whole engine state

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{CompletionRecord, Timer, TimerId, TimerRuntimeState};

/// Everything the engine persists, in the on-disk layout
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Next id to issue; older snapshots without it are repaired on load
    #[serde(default)]
    pub next_id: u64,
    #[serde(default)]
    pub timers: Vec<Timer>,
    #[serde(default)]
    pub runtime_states: BTreeMap<TimerId, TimerRuntimeState>,
    #[serde(default)]
    pub history: Vec<CompletionRecord>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty() && self.runtime_states.is_empty() && self.history.is_empty()
    }

    pub fn runtime_state(&self, id: TimerId) -> Option<&TimerRuntimeState> {
        self.runtime_states.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::state::TimerStatus;

    #[test]
    fn json_layout_uses_camel_case_keys() {
        let snapshot = Snapshot {
            next_id: 2,
            timers: vec![Timer {
                id: TimerId(1),
                name: "Focus".to_string(),
                duration_seconds: 5,
                category: "Work".to_string(),
            }],
            runtime_states: BTreeMap::from([(TimerId(1), TimerRuntimeState::pending(5))]),
            history: vec![CompletionRecord {
                name: "Focus".to_string(),
                category: "Work".to_string(),
                duration_seconds: 5,
                completed_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            }],
        };

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["nextId"], 2);
        assert_eq!(value["timers"][0]["durationSeconds"], 5);
        assert_eq!(value["runtimeStates"]["1"]["timeLeftSeconds"], 5);
        assert_eq!(value["runtimeStates"]["1"]["status"], "Pending");
        assert_eq!(value["history"][0]["completedAt"], "2024-05-01T12:00:00Z");

        let back: Snapshot = serde_json::from_value(value).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let snapshot: Snapshot = serde_json::from_str(r#"{"timers": []}"#).unwrap();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.next_id, 0);
        assert_eq!(snapshot.runtime_state(TimerId(1)).map(|s| s.status), None::<TimerStatus>);
    }
}
