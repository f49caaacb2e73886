//! Memory SSA graph domain model
//!
//! Every location has exactly one initial definition (Top or entry), created
//! first so that `DefId(n)` is the initial definition of `LocId(n)`. Phi
//! nodes follow, then operation definitions in renaming order.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::features::flow_graph::domain::StoreKind;
use crate::shared::models::{BlockId, DefId, LocId, ProgramPoint, UseId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefSite {
    /// Procedure entry
    Entry,
    /// Start of a merge block (Phi)
    BlockStart(BlockId),
    /// After the operation at this point
    Op(ProgramPoint),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChiCause {
    /// Direct store to an enclosing or partially overlapping location
    Partial,
    /// Store through memory that may alias an escaped location
    MayAlias,
    Call,
    Opaque,
    /// Store to a pointer variable: its pointee is now other memory
    Retarget,
    /// Store whose target could not be resolved precisely
    WeakWrite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefKind {
    /// Never defined
    Top,
    /// Holds a value on entry (parameter, static, extern, external memory)
    Entry,
    Write { kind: StoreKind },
    /// Aggregate copy; `source` is the definition of the mirrored source
    /// location, when it is tracked
    Copy { source: Option<DefId> },
    /// One operand per reachable predecessor, in predecessor order
    Phi { operands: Vec<(BlockId, DefId)> },
    /// May-write: the old value survives unless the write covered it
    Chi { prior: DefId, cause: ChiCause },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    pub id: DefId,
    pub location: LocId,
    pub site: DefSite,
    pub kind: DefKind,
}

impl Definition {
    pub fn is_top(&self) -> bool {
        matches!(self.kind, DefKind::Top)
    }

    pub fn is_phi(&self) -> bool {
        matches!(self.kind, DefKind::Phi { .. })
    }

    pub fn is_chi(&self) -> bool {
        matches!(self.kind, DefKind::Chi { .. })
    }

    pub fn point(&self) -> Option<ProgramPoint> {
        match self.site {
            DefSite::Op(point) => Some(point),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SsaGraph {
    definitions: Vec<Definition>,
    /// Reaching definition per use; `None` for uses in unreachable blocks
    use_defs: Vec<Option<DefId>>,
    /// Phi definitions per block, in location order
    phis: Vec<Vec<DefId>>,
    location_count: usize,
}

impl SsaGraph {
    pub fn new(location_count: usize, block_count: usize, use_count: usize) -> Self {
        Self {
            definitions: Vec::new(),
            use_defs: vec![None; use_count],
            phis: vec![Vec::new(); block_count],
            location_count,
        }
    }

    /// Append a definition, assigning the next id
    pub fn push(&mut self, location: LocId, site: DefSite, kind: DefKind) -> DefId {
        let id = DefId::new(self.definitions.len());
        if let (DefSite::BlockStart(block), DefKind::Phi { .. }) = (site, &kind) {
            if let Some(phis) = self.phis.get_mut(block.index()) {
                phis.push(id);
            }
        }
        self.definitions.push(Definition {
            id,
            location,
            site,
            kind,
        });
        id
    }

    pub fn set_use_def(&mut self, use_id: UseId, def: DefId) {
        if let Some(slot) = self.use_defs.get_mut(use_id.index()) {
            *slot = Some(def);
        }
    }

    pub fn set_phi_operands(&mut self, phi: DefId, operands: Vec<(BlockId, DefId)>) {
        if let Some(definition) = self.definitions.get_mut(phi.index()) {
            if let DefKind::Phi { operands: slots } = &mut definition.kind {
                *slots = operands;
            }
        }
    }

    /// Remove definitions, redirecting every reference to a replacement
    ///
    /// Replacement chains are followed to a definition that stays. The
    /// remaining definitions are renumbered in order; initial definitions
    /// must not be removed.
    pub fn remove_definitions(&mut self, replaced: &AHashMap<DefId, DefId>) {
        if replaced.is_empty() {
            return;
        }
        let mut renumbered = vec![None; self.definitions.len()];
        let mut next = 0;
        for definition in &self.definitions {
            if !replaced.contains_key(&definition.id) {
                renumbered[definition.id.index()] = Some(DefId::new(next));
                next += 1;
            }
        }
        let map = |id: DefId| {
            let mut current = id;
            for _ in 0..=replaced.len() {
                match replaced.get(&current) {
                    Some(target) => current = *target,
                    None => break,
                }
            }
            renumbered
                .get(current.index())
                .copied()
                .flatten()
                .unwrap_or(current)
        };

        self.definitions
            .retain(|definition| !replaced.contains_key(&definition.id));
        for definition in &mut self.definitions {
            definition.id = map(definition.id);
            match &mut definition.kind {
                DefKind::Phi { operands } => {
                    for (_, def) in operands.iter_mut() {
                        *def = map(*def);
                    }
                }
                DefKind::Chi { prior, .. } => *prior = map(*prior),
                DefKind::Copy {
                    source: Some(source),
                } => *source = map(*source),
                DefKind::Top | DefKind::Entry | DefKind::Write { .. } | DefKind::Copy { source: None } => {}
            }
        }
        for slot in self.use_defs.iter_mut().flatten() {
            *slot = map(*slot);
        }
        for phis in &mut self.phis {
            for phi in phis.iter_mut() {
                *phi = map(*phi);
            }
        }
    }

    pub fn definition(&self, id: DefId) -> Option<&Definition> {
        self.definitions.get(id.index())
    }

    pub fn definitions(&self) -> &[Definition] {
        &self.definitions
    }

    pub fn use_def(&self, use_id: UseId) -> Option<DefId> {
        self.use_defs.get(use_id.index()).copied().flatten()
    }

    pub fn phis_at(&self, block: BlockId) -> &[DefId] {
        self.phis
            .get(block.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Top or entry definition of a location
    pub fn initial_def(&self, location: LocId) -> Option<DefId> {
        (location.index() < self.location_count).then(|| DefId::new(location.index()))
    }

    pub fn defs_of(&self, location: LocId) -> impl Iterator<Item = &Definition> + '_ {
        self.definitions
            .iter()
            .filter(move |definition| definition.location == location)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
