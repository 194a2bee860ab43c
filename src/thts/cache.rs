//! State-value cache (spec.md §3/§4.5). Grounded in PROST's
//! `stateValueCache` field on `THTS` (`thts.h`/`thts.cc`:
//! `currentStateIsSolved`, `visitDecisionNode`): a hash map keyed by
//! `(state, stepsToGo)` storing the reward-to-go once a decision node at
//! that depth is proven solved, consulted before expanding a fresh node and
//! written through the moment a node is solved.
//!
//! The reward-cache ingredient PROST calls IDS-specific caching is out of
//! scope (`spec.md` Non-goals); this is the general-purpose cache every
//! `Initializer`/backup path shares.

use std::collections::HashMap;
use std::hash::Hash;

pub struct StateValueCache<S: Eq + Hash> {
    enabled: bool,
    entries: HashMap<(S, usize), f64>,
}

impl<S: Eq + Hash + Clone> StateValueCache<S> {
    pub fn new() -> Self {
        Self {
            enabled: true,
            entries: HashMap::new(),
        }
    }

    pub fn disable(&mut self) {
        self.enabled = false;
        self.entries.clear();
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn get(&self, state: &S, steps_to_go: usize) -> Option<f64> {
        if !self.enabled {
            return None;
        }
        self.entries.get(&(state.clone(), steps_to_go)).copied()
    }

    /// write-through only if the key isn't already present, matching
    /// PROST's "insert if absent" semantics in `currentStateIsSolved`.
    pub fn insert_if_absent(&mut self, state: S, steps_to_go: usize, value: f64) {
        if !self.enabled {
            return;
        }
        self.entries.entry((state, steps_to_go)).or_insert(value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Eq + Hash + Clone> Default for StateValueCache<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_if_absent_keeps_first_value() {
        let mut cache: StateValueCache<u32> = StateValueCache::new();
        cache.insert_if_absent(1, 3, 10.0);
        cache.insert_if_absent(1, 3, 99.0);
        assert_eq!(cache.get(&1, 3), Some(10.0));
    }

    #[test]
    fn disabling_clears_and_blocks_reads() {
        let mut cache: StateValueCache<u32> = StateValueCache::new();
        cache.insert_if_absent(1, 3, 10.0);
        cache.disable();
        assert_eq!(cache.get(&1, 3), None);
        cache.insert_if_absent(1, 3, 5.0);
        assert_eq!(cache.get(&1, 3), None);
    }
}
