//! Flow-sensitive escape tracking over the flow graph
//!
//! Forward may-analysis: block entry sets are the join of the exit sets of
//! their reachable predecessors, iterated to a fixpoint. Escape only ever
//! grows along a path.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::features::escape_analysis::domain::{EscapeSet, EscapeState};
use crate::features::flow_graph::domain::{Cfg, Operation};
use crate::features::memory_model::domain::{classify, AbstractLocation, LocationRoot};
use crate::features::procedure::domain::Scope;
use crate::shared::models::{BlockId, ProgramPoint};

/// A call that is not pure, with the addresses it received
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSiteRecord {
    pub point: ProgramPoint,
    pub callee: String,
    pub received: Vec<AbstractLocation>,
}

#[derive(Debug, Clone)]
pub struct EscapeSummary {
    entry_sets: Vec<EscapeSet>,
    /// Union over every reachable program point
    may_escape: EscapeSet,
    first_escape: BTreeMap<AbstractLocation, ProgramPoint>,
    call_sites: Vec<CallSiteRecord>,
    scope: Scope,
}

impl EscapeSummary {
    pub fn analyze(cfg: &Cfg) -> Self {
        let mut entry_sets = vec![EscapeSet::new(); cfg.len()];

        let mut changed = true;
        let mut rounds = 0usize;
        while changed {
            changed = false;
            rounds += 1;
            for block in cfg.reachable_blocks() {
                let mut set = entry_sets[block.id.index()].clone();
                for op in &block.ops {
                    Self::transfer(&mut set, op);
                }
                for succ in block.successor_ids() {
                    if let Some(entry) = entry_sets.get_mut(succ.index()) {
                        changed |= entry.join(&set);
                    }
                }
            }
        }

        let mut may_escape = EscapeSet::new();
        let mut first_escape = BTreeMap::new();
        let mut call_sites = Vec::new();
        for block in cfg.reachable_blocks() {
            let mut set = entry_sets[block.id.index()].clone();
            for (index, op) in block.ops.iter().enumerate() {
                let point = ProgramPoint::new(block.id, index);
                Self::transfer(&mut set, op);
                for location in escaping_operands(op) {
                    first_escape
                        .entry(location.clone())
                        .and_modify(|first: &mut ProgramPoint| *first = (*first).min(point))
                        .or_insert(point);
                }
                if let Operation::Call {
                    callee,
                    pure: false,
                    arg_addresses,
                } = op
                {
                    call_sites.push(CallSiteRecord {
                        point,
                        callee: callee.clone(),
                        received: arg_addresses.clone(),
                    });
                }
            }
            may_escape.join(&entry_sets[block.id.index()]);
            may_escape.join(&set);
        }
        call_sites.sort_by_key(|site| site.point);

        tracing::debug!(
            procedure = %cfg.name,
            rounds,
            escaped = may_escape.len(),
            call_sites = call_sites.len(),
            "escape analysis finished"
        );

        Self {
            entry_sets,
            may_escape,
            first_escape,
            call_sites,
            scope: cfg.scope.clone(),
        }
    }

    /// Effect of one operation on the escape facts
    pub fn transfer(set: &mut EscapeSet, op: &Operation) {
        match op {
            Operation::AddressTaken { location } => {
                set.raise(location, EscapeState::AddressTaken);
            }
            Operation::Call {
                pure: false,
                arg_addresses: addresses,
                ..
            }
            | Operation::Opaque {
                operands: addresses,
            } => {
                // An address stored anywhere earlier may be handed on by the callee
                set.raise_all(EscapeState::ArgEscape);
                for location in addresses {
                    set.raise(location, EscapeState::ArgEscape);
                }
            }
            Operation::Call { pure: true, .. }
            | Operation::Load { .. }
            | Operation::Store { .. }
            | Operation::Copy { .. } => {}
        }
    }

    /// State of `location` under the facts in `set`
    pub fn state_in(&self, set: &EscapeSet, location: &AbstractLocation) -> EscapeState {
        match &location.root {
            LocationRoot::Var(name) if self.scope.is_global(name) => EscapeState::GlobalEscape,
            _ => set.state_of(location),
        }
    }

    pub fn entry_set(&self, block: BlockId) -> Option<&EscapeSet> {
        self.entry_sets.get(block.index())
    }

    /// Facts holding just before the operation at `point`
    pub fn set_before(&self, cfg: &Cfg, point: ProgramPoint) -> EscapeSet {
        let mut set = self.entry_set(point.block).cloned().unwrap_or_default();
        if let Some(block) = cfg.block(point.block) {
            for op in block.ops.iter().take(point.index) {
                Self::transfer(&mut set, op);
            }
        }
        set
    }

    pub fn state_at(&self, cfg: &Cfg, point: ProgramPoint, location: &AbstractLocation) -> EscapeState {
        let set = self.set_before(cfg, point);
        self.state_in(&set, location)
    }

    /// Strongest state `location` reaches anywhere in the procedure
    pub fn final_state(&self, location: &AbstractLocation) -> EscapeState {
        self.state_in(&self.may_escape, location)
    }

    pub fn first_escape(&self, location: &AbstractLocation) -> Option<ProgramPoint> {
        self.first_escape
            .iter()
            .filter(|(escaped, _)| {
                escaped.root == location.root && classify(escaped, location).overlaps()
            })
            .map(|(_, point)| *point)
            .min()
    }

    pub fn call_sites(&self) -> &[CallSiteRecord] {
        &self.call_sites
    }

    /// Locations whose address is materialized somewhere
    pub fn escaped_locations(&self) -> Vec<(&AbstractLocation, EscapeState)> {
        self.may_escape.entries()
    }
}

fn escaping_operands(op: &Operation) -> &[AbstractLocation] {
    match op {
        Operation::AddressTaken { location } => std::slice::from_ref(location),
        Operation::Call {
            pure: false,
            arg_addresses,
            ..
        } => arg_addresses,
        Operation::Opaque { operands } => operands,
        _ => &[],
    }
}
