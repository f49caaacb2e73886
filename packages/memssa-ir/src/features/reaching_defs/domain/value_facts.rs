//! Flattening and value classification over the SSA graph
//!
//! Both walks are iterative: Chi chains grow with every call on an escaped
//! location and Phi cycles come from loops.

use ahash::{AHashMap, AHashSet};

use super::initialization::Initialization;
use crate::features::ssa::domain::{DefKind, SsaGraph};
use crate::shared::models::DefId;

/// Non-Phi definitions reachable from `start` through Phi operands, by id
pub fn flatten_phis(graph: &SsaGraph, start: DefId) -> Vec<DefId> {
    let mut visited = AHashSet::new();
    let mut stack = vec![start];
    let mut result = Vec::new();
    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        match graph.definition(id).map(|d| &d.kind) {
            Some(DefKind::Phi { operands }) => {
                stack.extend(operands.iter().map(|(_, def)| *def));
            }
            Some(_) => result.push(id),
            None => {}
        }
    }
    result.sort();
    result
}

/// What the values flowing into a definition may be
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValueFacts {
    /// Some path carries a never-defined value
    pub top: bool,
    /// Some path carries a defined value
    pub value: bool,
    /// Some defined value was produced by a may-write
    pub unknown_value: bool,
    /// Some may-write landed on a never-defined value
    pub chi_over_top: bool,
}

impl ValueFacts {
    fn merge(&mut self, other: ValueFacts) {
        self.top |= other.top;
        self.value |= other.value;
        self.unknown_value |= other.unknown_value;
        self.chi_over_top |= other.chi_over_top;
    }

    pub fn classify(&self) -> Initialization {
        match (self.top, self.value) {
            (false, false) => Initialization::Unknown,
            (true, false) => Initialization::Uninitialized,
            (true, true) => Initialization::MaybeUninitialized,
            (false, true) if self.chi_over_top => Initialization::PartiallyInitialized,
            (false, true) if self.unknown_value => Initialization::InitializedUnknownValue,
            (false, true) => Initialization::Initialized,
        }
    }
}

fn dependencies(kind: &DefKind) -> Vec<DefId> {
    match kind {
        DefKind::Phi { operands } => operands.iter().map(|(_, def)| *def).collect(),
        DefKind::Chi { prior, .. } => vec![*prior],
        DefKind::Copy { source: Some(source) } => vec![*source],
        DefKind::Top | DefKind::Entry | DefKind::Write { .. } | DefKind::Copy { source: None } => {
            Vec::new()
        }
    }
}

/// Facts for `start`, following Phi operands, Chi priors and copy sources
pub fn value_facts(graph: &SsaGraph, start: DefId) -> ValueFacts {
    // Everything `start` depends on
    let mut reached = AHashSet::new();
    let mut stack = vec![start];
    while let Some(id) = stack.pop() {
        if !reached.insert(id) {
            continue;
        }
        if let Some(definition) = graph.definition(id) {
            stack.extend(dependencies(&definition.kind));
        }
    }
    let mut order: Vec<DefId> = reached.into_iter().collect();
    order.sort();

    // Monotone flags: iterate to a fixpoint, cycles start from no facts
    let mut facts: AHashMap<DefId, ValueFacts> = AHashMap::new();
    let mut changed = true;
    while changed {
        changed = false;
        for id in &order {
            let Some(definition) = graph.definition(*id) else {
                continue;
            };
            let of = |def: &DefId| facts.get(def).copied().unwrap_or_default();
            let next = match &definition.kind {
                DefKind::Top => ValueFacts {
                    top: true,
                    ..ValueFacts::default()
                },
                DefKind::Entry | DefKind::Write { .. } => ValueFacts {
                    value: true,
                    ..ValueFacts::default()
                },
                DefKind::Copy { source: None } => ValueFacts {
                    value: true,
                    unknown_value: true,
                    ..ValueFacts::default()
                },
                DefKind::Copy {
                    source: Some(source),
                } => of(source),
                DefKind::Phi { operands } => {
                    let mut merged = ValueFacts::default();
                    for (_, def) in operands {
                        merged.merge(of(def));
                    }
                    merged
                }
                DefKind::Chi { prior, .. } => {
                    let prior = of(prior);
                    ValueFacts {
                        top: false,
                        value: true,
                        unknown_value: true,
                        chi_over_top: prior.top || prior.chi_over_top,
                    }
                }
            };
            let current = facts.entry(*id).or_default();
            let mut merged = *current;
            merged.merge(next);
            if merged != *current {
                *current = merged;
                changed = true;
            }
        }
    }
    facts.get(&start).copied().unwrap_or_default()
}
