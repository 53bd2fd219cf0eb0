//! Registry of immutable timer definitions

use indexmap::IndexMap;

use crate::error::{EngineError, Result};
use super::{Timer, TimerId};

/// Ordered collection of timers plus the id counter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerRegistry {
    next_id: u64,
    timers: Vec<Timer>,
}

impl TimerRegistry {
    /// Rebuild a registry from persisted parts.
    ///
    /// The counter is raised past every stored id so a stale counter can never reissue one.
    /// A stored id of `u64::MAX` leaves the counter exhausted.
    pub fn from_parts(next_id: u64, timers: Vec<Timer>) -> Self {
        let floor = timers
            .iter()
            .map(|t| t.id.0.saturating_add(1))
            .max()
            .unwrap_or(1);
        Self {
            next_id: next_id.max(floor),
            timers,
        }
    }

    /// Validate and insert a new timer
    pub fn add(&mut self, name: &str, duration_seconds: u64, category: &str) -> Result<Timer> {
        let name = name.trim();
        let category = category.trim();
        if name.is_empty() {
            return Err(EngineError::InvalidInput("name must not be empty".to_string()));
        }
        if duration_seconds == 0 {
            return Err(EngineError::InvalidInput("duration must be positive".to_string()));
        }
        if category.is_empty() {
            return Err(EngineError::InvalidInput("category must not be empty".to_string()));
        }

        let timer = Timer {
            id: self.allocate_id()?,
            name: name.to_string(),
            duration_seconds,
            category: category.to_string(),
        };
        self.timers.push(timer.clone());
        Ok(timer)
    }

    fn allocate_id(&mut self) -> Result<TimerId> {
        // Ids start at 1; u64::MAX is never issued and marks the counter as exhausted
        let id = self.next_id.max(1);
        let next = id
            .checked_add(1)
            .ok_or_else(|| EngineError::InvalidInput("timer ids exhausted".to_string()))?;
        self.next_id = next;
        Ok(TimerId(id))
    }

    pub fn get(&self, id: TimerId) -> Option<&Timer> {
        self.timers.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: TimerId) -> bool {
        self.get(id).is_some()
    }

    /// Timers in insertion order
    pub fn timers(&self) -> &[Timer] {
        &self.timers
    }

    pub fn next_id(&self) -> u64 {
        self.next_id.max(1)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Timers whose category equals `category` exactly
    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Timer> + 'a {
        self.timers.iter().filter(move |t| t.category == category)
    }

    /// Group timers by category, categories in order of first appearance
    pub fn by_category(&self) -> IndexMap<String, Vec<Timer>> {
        let mut groups: IndexMap<String, Vec<Timer>> = IndexMap::new();
        for timer in &self.timers {
            groups
                .entry(timer.category.clone())
                .or_default()
                .push(timer.clone());
        }
        groups
    }

    /// Drop every timer. The id counter is kept.
    pub fn clear(&mut self) {
        self.timers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_rejects_invalid_definitions() {
        let mut registry = TimerRegistry::default();
        assert!(matches!(registry.add("", 5, "Work"), Err(EngineError::InvalidInput(_))));
        assert!(matches!(registry.add("   ", 5, "Work"), Err(EngineError::InvalidInput(_))));
        assert!(matches!(registry.add("Focus", 0, "Work"), Err(EngineError::InvalidInput(_))));
        assert!(matches!(registry.add("Focus", 5, ""), Err(EngineError::InvalidInput(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn ids_are_never_reused_after_clear() {
        let mut registry = TimerRegistry::default();
        let a = registry.add("A", 5, "Work").unwrap();
        let b = registry.add("B", 5, "Work").unwrap();
        assert_eq!(a.id, TimerId(1));
        assert_eq!(b.id, TimerId(2));

        registry.clear();
        let c = registry.add("C", 5, "Work").unwrap();
        assert_eq!(c.id, TimerId(3));
    }

    #[test]
    fn from_parts_repairs_stale_counter() {
        let mut seed = TimerRegistry::default();
        seed.add("A", 5, "Work").unwrap();
        seed.add("B", 5, "Work").unwrap();

        let mut registry = TimerRegistry::from_parts(0, seed.timers().to_vec());
        assert_eq!(registry.add("C", 1, "Work").unwrap().id, TimerId(3));
    }

    #[test]
    fn maximal_stored_id_exhausts_counter_without_overflow() {
        let timers = vec![Timer {
            id: TimerId(u64::MAX),
            name: "Last".to_string(),
            duration_seconds: 5,
            category: "Work".to_string(),
        }];
        let mut registry = TimerRegistry::from_parts(3, timers);
        assert_eq!(registry.next_id(), u64::MAX);
        assert!(matches!(registry.add("More", 5, "Work"), Err(EngineError::InvalidInput(_))));
        assert_eq!(registry.len(), 1);

        let mut registry = TimerRegistry::from_parts(u64::MAX - 1, Vec::new());
        assert_eq!(registry.add("Penultimate", 5, "Work").unwrap().id, TimerId(u64::MAX - 1));
        assert!(matches!(registry.add("Overflow", 5, "Work"), Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn groups_keep_insertion_order() {
        let mut registry = TimerRegistry::default();
        registry.add("Focus", 5, "Work").unwrap();
        registry.add("Nap", 5, "Rest").unwrap();
        registry.add("Email", 5, " Work ").unwrap();

        let groups = registry.by_category();
        let categories: Vec<&String> = groups.keys().collect();
        assert_eq!(categories, ["Work", "Rest"]);
        let work: Vec<&str> = groups["Work"].iter().map(|t| t.name.as_str()).collect();
        assert_eq!(work, ["Focus", "Email"]);
    }
}
