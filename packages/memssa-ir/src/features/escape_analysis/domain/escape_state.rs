//! Escape lattice for local memory
//!
//! ```text
//! NoEscape        // only named directly in this procedure
//!   AddressTaken  // address materialized (`&x`, array decay, asm operand)
//!   ArgEscape     // address may have reached a callee
//! GlobalEscape    // reachable from outside regardless (pointees, globals)
//! ```
//!
//! A location is *escaped* once it reaches `AddressTaken`; from then on every
//! call that is not pure may write it.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::features::memory_model::domain::{classify, AbstractLocation, Overlap};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum EscapeState {
    #[default]
    NoEscape,
    AddressTaken,
    ArgEscape,
    GlobalEscape,
}

impl EscapeState {
    pub fn is_escaped(&self) -> bool {
        *self >= EscapeState::AddressTaken
    }

    /// Conservative join
    pub fn merge(&self, other: &EscapeState) -> EscapeState {
        (*self).max(*other)
    }
}

impl fmt::Display for EscapeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EscapeState::NoEscape => "NoEscape",
            EscapeState::AddressTaken => "AddressTaken",
            EscapeState::ArgEscape => "ArgEscape",
            EscapeState::GlobalEscape => "GlobalEscape",
        };
        write!(f, "{}", s)
    }
}

/// Escape facts at one program point
///
/// Entries are the locations whose address was materialized. A query for a
/// location takes the strongest entry of the same root that is not disjoint
/// from it: taking `&s.x` escapes `s` and `s.x`, but not `s.y`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EscapeSet {
    entries: AHashMap<AbstractLocation, EscapeState>,
}

impl EscapeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise `location` to at least `state`; true if anything changed
    pub fn raise(&mut self, location: &AbstractLocation, state: EscapeState) -> bool {
        match self.entries.get_mut(location) {
            Some(current) if *current >= state => false,
            Some(current) => {
                *current = state;
                true
            }
            None => {
                self.entries.insert(location.clone(), state);
                true
            }
        }
    }

    /// Raise every entry to at least `state`
    pub fn raise_all(&mut self, state: EscapeState) -> bool {
        let mut changed = false;
        for current in self.entries.values_mut() {
            if *current < state {
                *current = state;
                changed = true;
            }
        }
        changed
    }

    /// Pointwise join; true if `self` grew
    pub fn join(&mut self, other: &EscapeSet) -> bool {
        let mut changed = false;
        for (location, state) in &other.entries {
            changed |= self.raise(location, *state);
        }
        changed
    }

    pub fn state_of(&self, location: &AbstractLocation) -> EscapeState {
        if location.root.is_external() {
            return EscapeState::GlobalEscape;
        }
        self.entries
            .iter()
            .filter(|(entry, _)| {
                entry.root == location.root && classify(entry, location) != Overlap::Disjoint
            })
            .map(|(_, state)| *state)
            .max()
            .unwrap_or_default()
    }

    pub fn is_escaped(&self, location: &AbstractLocation) -> bool {
        self.state_of(location).is_escaped()
    }

    /// Escaped entries in a stable order
    pub fn entries(&self) -> Vec<(&AbstractLocation, EscapeState)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(location, state)| (location, *state))
            .collect();
        entries.sort();
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
