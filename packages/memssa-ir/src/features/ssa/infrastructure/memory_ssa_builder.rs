/*
 * Memory SSA Builder
 *
 * Cytron-style construction over abstract locations:
 * 1. Effects: per operation, the locations it defines or may define
 * 2. Phi placement at the iterated dominance frontier of each location's
 *    defining blocks (reachable blocks only)
 * 3. Renaming: dominator-tree preorder, one definition stack per location
 *
 * Chi nodes come out of the effects. Once Phi operands are complete, a Chi
 * for a call or opaque operation over a location that carries no value on
 * any path is dropped; the location keeps its never-defined state and a
 * precision note is left instead.
 */

use ahash::{AHashMap, AHashSet};

use super::effects::{Effect, EffectMap};
use super::errors::{SsaError, SsaResult};
use super::memory_ssa::MemorySsa;
use crate::features::escape_analysis::EscapeSummary;
use crate::features::flow_graph::domain::{Cfg, Operation};
use crate::features::flow_graph::infrastructure::DominatorTree;
use crate::features::memory_model::domain::{AbstractLocation, LocationRoot};
use crate::features::memory_model::infrastructure::LocationTable;
use crate::features::procedure::domain::Scope;
use crate::features::ssa::domain::{ChiCause, DefKind, DefSite, SsaGraph};
use crate::shared::models::{BlockId, DefId, LocId, NoteReason, PrecisionNote, ProgramPoint};

pub fn build_memory_ssa(
    cfg: Cfg,
    locations: LocationTable,
    escape: EscapeSummary,
) -> SsaResult<MemorySsa> {
    if cfg.block(cfg.entry()).is_none() {
        return Err(SsaError::InvalidCfg {
            reason: format!("procedure '{}' has no entry block", cfg.name),
        });
    }

    let dominators = DominatorTree::compute(&cfg);
    let effects = EffectMap::compute(&cfg, &locations, &escape)?;

    let mut builder = MemorySsaBuilder::new(&cfg, &locations, &dominators, &effects);
    builder.create_initial_defs();
    builder.place_phis();
    builder.rename()?;
    let (graph, ssa_notes) = builder.finish();

    let mut notes = cfg.notes.clone();
    notes.extend(ssa_notes);

    tracing::debug!(
        procedure = %cfg.name,
        locations = locations.len(),
        definitions = graph.len(),
        phis = graph.definitions().iter().filter(|d| d.is_phi()).count(),
        chis = graph.definitions().iter().filter(|d| d.is_chi()).count(),
        "memory SSA built"
    );

    Ok(MemorySsa {
        cfg,
        locations,
        escape,
        dominators,
        graph,
        notes,
    })
}

/// Whether some path into each definition carries a defined value
///
/// Least fixpoint: loops start from "no value". Call and opaque Chis pass
/// their prior through, since they are dropped when it carries nothing.
fn carries_value(graph: &SsaGraph) -> Vec<bool> {
    let definitions = graph.definitions();
    let mut carries = vec![false; definitions.len()];
    let mut changed = true;
    while changed {
        changed = false;
        for definition in definitions {
            let of = |id: &DefId| carries.get(id.index()).copied().unwrap_or(false);
            let value = match &definition.kind {
                DefKind::Top => false,
                DefKind::Entry | DefKind::Write { .. } | DefKind::Copy { source: None } => true,
                DefKind::Copy {
                    source: Some(source),
                } => of(source),
                DefKind::Phi { operands } => operands.iter().any(|(_, def)| of(def)),
                DefKind::Chi {
                    prior,
                    cause: ChiCause::Call | ChiCause::Opaque,
                } => of(prior),
                DefKind::Chi { .. } => true,
            };
            if value && !carries[definition.id.index()] {
                carries[definition.id.index()] = true;
                changed = true;
            }
        }
    }
    carries
}

fn starts_defined(location: &AbstractLocation, scope: &Scope) -> bool {
    match &location.root {
        LocationRoot::Var(name) => scope.starts_defined(name),
        LocationRoot::Pointee(_) | LocationRoot::Unknown(_) => true,
    }
}

enum Walk {
    Enter(BlockId),
    Leave(Vec<LocId>),
}

struct MemorySsaBuilder<'a> {
    cfg: &'a Cfg,
    locations: &'a LocationTable,
    dominators: &'a DominatorTree,
    effects: &'a EffectMap,
    graph: SsaGraph,
    stacks: Vec<Vec<DefId>>,
    /// Phi operand slots: (predecessor, incoming definition once known)
    phi_slots: AHashMap<DefId, Vec<(BlockId, Option<DefId>)>>,
    notes: Vec<PrecisionNote>,
    noted: AHashSet<(ProgramPoint, LocId)>,
}

impl<'a> MemorySsaBuilder<'a> {
    fn new(
        cfg: &'a Cfg,
        locations: &'a LocationTable,
        dominators: &'a DominatorTree,
        effects: &'a EffectMap,
    ) -> Self {
        Self {
            cfg,
            locations,
            dominators,
            effects,
            graph: SsaGraph::new(locations.len(), cfg.len(), cfg.uses.len()),
            stacks: vec![Vec::new(); locations.len()],
            phi_slots: AHashMap::new(),
            notes: Vec::new(),
            noted: AHashSet::new(),
        }
    }

    fn create_initial_defs(&mut self) {
        let locations = self.locations;
        for (id, location) in locations.iter() {
            let kind = if starts_defined(location, &self.cfg.scope) {
                DefKind::Entry
            } else {
                DefKind::Top
            };
            let def = self.graph.push(id, DefSite::Entry, kind);
            self.stacks[id.index()].push(def);
        }
    }

    fn place_phis(&mut self) {
        let effects = self.effects;
        for (id, _) in self.locations.iter() {
            let def_blocks = effects.def_blocks(id);
            if def_blocks.is_empty() {
                continue;
            }
            for block in self.dominators.iterated_frontier(def_blocks.iter().copied()) {
                let slots: Vec<_> = self
                    .cfg
                    .reachable_predecessors(block)
                    .into_iter()
                    .map(|pred| (pred, None))
                    .collect();
                let phi = self.graph.push(
                    id,
                    DefSite::BlockStart(block),
                    DefKind::Phi {
                        operands: Vec::new(),
                    },
                );
                self.phi_slots.insert(phi, slots);
            }
        }
    }

    fn current(&self, location: LocId) -> DefId {
        self.stacks
            .get(location.index())
            .and_then(|stack| stack.last())
            .copied()
            .unwrap_or_else(|| DefId::new(location.index()))
    }

    fn push_def(&mut self, location: LocId, def: DefId, pushed: &mut Vec<LocId>) {
        if let Some(stack) = self.stacks.get_mut(location.index()) {
            stack.push(def);
            pushed.push(location);
        }
    }

    fn rename(&mut self) -> SsaResult<()> {
        let mut work = Vec::new();
        let entry = self.cfg.entry();
        if self.cfg.is_reachable(entry) {
            work.push(Walk::Enter(entry));
        }
        while let Some(step) = work.pop() {
            match step {
                Walk::Enter(block) => {
                    let pushed = self.rename_block(block)?;
                    work.push(Walk::Leave(pushed));
                    for child in self.dominators.children(block).iter().rev() {
                        work.push(Walk::Enter(*child));
                    }
                }
                Walk::Leave(pushed) => {
                    for location in pushed.iter().rev() {
                        if let Some(stack) = self.stacks.get_mut(location.index()) {
                            stack.pop();
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn rename_block(&mut self, id: BlockId) -> SsaResult<Vec<LocId>> {
        let cfg = self.cfg;
        let mut pushed = Vec::new();
        let Some(block) = cfg.block(id) else {
            return Ok(pushed);
        };

        for phi in self.graph.phis_at(id).to_vec() {
            if let Some(location) = self.graph.definition(phi).map(|d| d.location) {
                self.push_def(location, phi, &mut pushed);
            }
        }

        for (index, op) in block.ops.iter().enumerate() {
            let point = ProgramPoint::new(id, index);
            if let Operation::Load { location, use_id } = op {
                let location = self.locations.id_of(location).ok_or_else(|| {
                    SsaError::UnknownLocation {
                        location: location.to_string(),
                        point,
                    }
                })?;
                if cfg.use_site(*use_id).is_none() {
                    return Err(SsaError::UnknownUse { use_id: *use_id });
                }
                let reaching = self.current(location);
                self.graph.set_use_def(*use_id, reaching);
            }
            self.apply_effects(point, &mut pushed);
        }

        let mut seen = AHashSet::new();
        for succ in block.successor_ids() {
            if !seen.insert(succ) {
                continue;
            }
            for phi in self.graph.phis_at(succ).to_vec() {
                let Some(location) = self.graph.definition(phi).map(|d| d.location) else {
                    continue;
                };
                let incoming = self.current(location);
                if let Some(slots) = self.phi_slots.get_mut(&phi) {
                    for (pred, slot) in slots.iter_mut() {
                        if *pred == id {
                            *slot = Some(incoming);
                        }
                    }
                }
            }
        }
        Ok(pushed)
    }

    fn apply_effects(&mut self, point: ProgramPoint, pushed: &mut Vec<LocId>) {
        let effects = self.effects;
        let effects = effects.at(point);
        // Copy sources are read before this operation defines anything
        let sources: Vec<Option<DefId>> = effects
            .iter()
            .map(|effect| match effect {
                Effect::Copy {
                    source: Some(source),
                    ..
                } => Some(self.current(*source)),
                _ => None,
            })
            .collect();

        for (effect, source) in effects.iter().zip(sources) {
            let site = DefSite::Op(point);
            let def = match *effect {
                Effect::Define { location, kind } => {
                    self.graph.push(location, site, DefKind::Write { kind })
                }
                Effect::Copy { location, .. } => {
                    self.graph.push(location, site, DefKind::Copy { source })
                }
                Effect::Chi { location, cause } => {
                    let prior = self.current(location);
                    self.graph.push(location, site, DefKind::Chi { prior, cause })
                }
            };
            self.push_def(effect.location(), def, pushed);
        }
    }

    fn note_write_over_undefined(&mut self, point: ProgramPoint, location: LocId) {
        if !self.noted.insert((point, location)) {
            return;
        }
        let name = self
            .locations
            .location(location)
            .map(ToString::to_string)
            .unwrap_or_default();
        self.notes.push(PrecisionNote {
            point: Some(point),
            location: name,
            reason: NoteReason::PossibleWriteOverUndefined,
        });
    }

    fn finish(mut self) -> (SsaGraph, Vec<PrecisionNote>) {
        let mut phis: Vec<_> = self.phi_slots.drain().collect();
        phis.sort_by_key(|(phi, _)| *phi);
        for (phi, slots) in phis {
            let fallback = self
                .graph
                .definition(phi)
                .and_then(|d| self.graph.initial_def(d.location))
                .unwrap_or(phi);
            let operands = slots
                .into_iter()
                .map(|(pred, def)| (pred, def.unwrap_or(fallback)))
                .collect();
            self.graph.set_phi_operands(phi, operands);
        }
        self.prune_writes_over_undefined();
        (self.graph, self.notes)
    }

    /// Drop call and opaque Chis whose prior carries no value on any path
    ///
    /// Runs once Phi operands are complete, so a prior that is a Phi over
    /// Top (or over Top and the Chi itself around a loop) is recognized.
    /// Uses and operands of a dropped Chi are redirected to its prior.
    fn prune_writes_over_undefined(&mut self) {
        let carries = carries_value(&self.graph);
        let mut replaced = AHashMap::new();
        let mut dropped = Vec::new();
        for definition in self.graph.definitions() {
            if let DefKind::Chi {
                prior,
                cause: ChiCause::Call | ChiCause::Opaque,
            } = definition.kind
            {
                if !carries[prior.index()] {
                    replaced.insert(definition.id, prior);
                    if let Some(point) = definition.point() {
                        dropped.push((point, definition.location));
                    }
                }
            }
        }
        for (point, location) in dropped {
            self.note_write_over_undefined(point, location);
        }
        if !replaced.is_empty() {
            tracing::debug!(
                procedure = %self.cfg.name,
                dropped = replaced.len(),
                "call chis over undefined locations dropped"
            );
            self.graph.remove_definitions(&replaced);
        }
    }
}
