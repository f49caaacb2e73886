//! What each operation defines, per location
//!
//! Computed block by block with the escape facts holding at the operation,
//! before any definition exists. The renamer turns effects into definitions;
//! Phi placement only needs the blocks they occur in.

use ahash::AHashSet;

use super::errors::{SsaError, SsaResult};
use crate::features::escape_analysis::{EscapeSet, EscapeSummary};
use crate::features::flow_graph::domain::{Cfg, Operation, StoreKind};
use crate::features::memory_model::domain::{AbstractLocation, LocationRoot};
use crate::features::memory_model::infrastructure::LocationTable;
use crate::features::ssa::domain::ChiCause;
use crate::shared::models::{BlockId, LocId, ProgramPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Strong write of the whole location
    Define { location: LocId, kind: StoreKind },
    /// Aggregate copy into the location from the mirrored source location
    Copy {
        location: LocId,
        source: Option<LocId>,
    },
    Chi { location: LocId, cause: ChiCause },
}

impl Effect {
    pub fn location(&self) -> LocId {
        match self {
            Effect::Define { location, .. }
            | Effect::Copy { location, .. }
            | Effect::Chi { location, .. } => *location,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EffectMap {
    /// `[block][op]`
    effects: Vec<Vec<Vec<Effect>>>,
    /// Blocks holding at least one effect, per location, in block order
    def_blocks: Vec<Vec<BlockId>>,
}

impl EffectMap {
    pub fn compute(cfg: &Cfg, table: &LocationTable, escape: &EscapeSummary) -> SsaResult<Self> {
        let mut map = Self {
            effects: cfg
                .blocks
                .iter()
                .map(|block| vec![Vec::new(); block.ops.len()])
                .collect(),
            def_blocks: vec![Vec::new(); table.len()],
        };
        let collector = Collector { table, escape };

        for block in cfg.reachable_blocks() {
            let mut set = escape.entry_set(block.id).cloned().unwrap_or_default();
            for (index, op) in block.ops.iter().enumerate() {
                let point = ProgramPoint::new(block.id, index);
                EscapeSummary::transfer(&mut set, op);
                let effects = collector.effects_of(op, &set, point)?;
                for effect in &effects {
                    let blocks = &mut map.def_blocks[effect.location().index()];
                    if blocks.last() != Some(&block.id) {
                        blocks.push(block.id);
                    }
                }
                map.effects[block.id.index()][index] = effects;
            }
        }
        Ok(map)
    }

    pub fn at(&self, point: ProgramPoint) -> &[Effect] {
        self.effects
            .get(point.block.index())
            .and_then(|ops| ops.get(point.index))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn def_blocks(&self, location: LocId) -> &[BlockId] {
        self.def_blocks
            .get(location.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

struct Collector<'a> {
    table: &'a LocationTable,
    escape: &'a EscapeSummary,
}

/// Effects of one operation, at most one per location
struct Effects {
    list: Vec<Effect>,
    seen: AHashSet<LocId>,
}

impl Effects {
    fn new() -> Self {
        Self {
            list: Vec::new(),
            seen: AHashSet::new(),
        }
    }

    fn push(&mut self, effect: Effect) {
        if self.seen.insert(effect.location()) {
            self.list.push(effect);
        }
    }
}

impl Collector<'_> {
    fn lookup(&self, location: &AbstractLocation, point: ProgramPoint) -> SsaResult<LocId> {
        self.table
            .id_of(location)
            .ok_or_else(|| SsaError::UnknownLocation {
                location: location.to_string(),
                point,
            })
    }

    fn effects_of(&self, op: &Operation, set: &EscapeSet, point: ProgramPoint) -> SsaResult<Vec<Effect>> {
        let mut out = Effects::new();
        match op {
            Operation::Store {
                location,
                kind,
                weak,
            } => {
                let id = self.lookup(location, point)?;
                let write = |sub: LocId| {
                    if *weak {
                        Effect::Chi {
                            location: sub,
                            cause: ChiCause::WeakWrite,
                        }
                    } else {
                        Effect::Define {
                            location: sub,
                            kind: *kind,
                        }
                    }
                };
                out.push(write(id));
                self.retarget(location, &mut out);
                self.overlapping(id, location, set, &mut out, |sub, _| write(sub));
            }
            Operation::Copy { dst, src } => {
                let id = self.lookup(dst, point)?;
                out.push(Effect::Copy {
                    location: id,
                    source: Some(self.lookup(src, point)?),
                });
                self.retarget(dst, &mut out);
                self.overlapping(id, dst, set, &mut out, |sub, inner| Effect::Copy {
                    location: sub,
                    source: inner
                        .rebase(dst, src)
                        .and_then(|mirrored| self.table.id_of(&mirrored)),
                });
            }
            Operation::Call { .. } if op.clobbers_escaped() => {
                self.clobber(set, ChiCause::Call, &mut out)
            }
            Operation::Opaque { .. } => self.clobber(set, ChiCause::Opaque, &mut out),
            Operation::Call { .. } | Operation::Load { .. } | Operation::AddressTaken { .. } => {}
        }
        Ok(out.list)
    }

    /// Effects on the locations overlapping a written `target`
    ///
    /// Sub-objects are written like the target itself; enclosing and
    /// partially overlapping locations of the same root get a partial Chi;
    /// other roots only when both sides are escaped.
    fn overlapping(
        &self,
        id: LocId,
        target: &AbstractLocation,
        set: &EscapeSet,
        out: &mut Effects,
        sub_effect: impl Fn(LocId, &AbstractLocation) -> Effect,
    ) {
        for &(other_id, _) in self.table.neighbours(id) {
            let Some(other) = self.table.location(other_id) else {
                continue;
            };
            if target.strictly_contains(other) {
                out.push(sub_effect(other_id, other));
            } else if other.root == target.root {
                out.push(Effect::Chi {
                    location: other_id,
                    cause: ChiCause::Partial,
                });
            } else if self.escape.state_in(set, other).is_escaped()
                && self.escape.state_in(set, target).is_escaped()
            {
                out.push(Effect::Chi {
                    location: other_id,
                    cause: ChiCause::MayAlias,
                });
            }
        }
    }

    /// A write to a whole pointer variable changes what its pointee names
    fn retarget(&self, target: &AbstractLocation, out: &mut Effects) {
        if let (LocationRoot::Var(pointer), true) = (&target.root, target.is_whole_object()) {
            for &pointee in self.table.pointee_locations(pointer) {
                out.push(Effect::Chi {
                    location: pointee,
                    cause: ChiCause::Retarget,
                });
            }
        }
    }

    fn clobber(&self, set: &EscapeSet, cause: ChiCause, out: &mut Effects) {
        for (id, location) in self.table.iter() {
            if self.escape.state_in(set, location).is_escaped() {
                out.push(Effect::Chi { location: id, cause });
            }
        }
    }
}
