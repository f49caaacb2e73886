//! Built memory SSA of one procedure
//!
//! Owns everything the queries need; immutable once built.

use serde::Serialize;

use crate::features::escape_analysis::EscapeSummary;
use crate::features::flow_graph::domain::{BlockKind, Cfg, EdgeKind};
use crate::features::flow_graph::infrastructure::DominatorTree;
use crate::features::memory_model::infrastructure::LocationTable;
use crate::features::ssa::domain::{Definition, SsaGraph};
use crate::shared::models::{BlockId, DefId, PrecisionNote, ProgramPoint, UseId};

#[derive(Debug, Clone)]
pub struct MemorySsa {
    pub(crate) cfg: Cfg,
    pub(crate) locations: LocationTable,
    pub(crate) escape: EscapeSummary,
    pub(crate) dominators: DominatorTree,
    pub(crate) graph: SsaGraph,
    pub(crate) notes: Vec<PrecisionNote>,
}

impl MemorySsa {
    pub fn name(&self) -> &str {
        &self.cfg.name
    }

    pub fn cfg(&self) -> &Cfg {
        &self.cfg
    }

    pub fn locations(&self) -> &LocationTable {
        &self.locations
    }

    pub fn escape(&self) -> &EscapeSummary {
        &self.escape
    }

    pub fn dominators(&self) -> &DominatorTree {
        &self.dominators
    }

    pub fn graph(&self) -> &SsaGraph {
        &self.graph
    }

    /// Resolution notes from lowering followed by SSA notes
    pub fn notes(&self) -> &[PrecisionNote] {
        &self.notes
    }

    pub fn definition(&self, id: DefId) -> Option<&Definition> {
        self.graph.definition(id)
    }

    pub fn snapshot(&self) -> SsaSnapshot<'_> {
        SsaSnapshot {
            procedure: &self.cfg.name,
            locations: self
                .locations
                .iter()
                .map(|(_, location)| location.to_string())
                .collect(),
            blocks: self
                .cfg
                .blocks
                .iter()
                .map(|block| BlockSnapshot {
                    id: block.id,
                    kind: block.kind,
                    reachable: block.reachable,
                    successors: block
                        .successors
                        .iter()
                        .map(|edge| (edge.target, edge.kind))
                        .collect(),
                    phis: self.graph.phis_at(block.id).to_vec(),
                })
                .collect(),
            definitions: self.graph.definitions(),
            uses: self
                .cfg
                .uses
                .iter()
                .map(|site| UseSnapshot {
                    id: site.id,
                    location: site.location.to_string(),
                    point: site.point,
                    reaching: self.graph.use_def(site.id),
                })
                .collect(),
            notes: &self.notes,
        }
    }

    /// Pretty-printed JSON of [`MemorySsa::snapshot`]
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.snapshot())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SsaSnapshot<'a> {
    pub procedure: &'a str,
    pub locations: Vec<String>,
    pub blocks: Vec<BlockSnapshot>,
    pub definitions: &'a [Definition],
    pub uses: Vec<UseSnapshot>,
    pub notes: &'a [PrecisionNote],
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockSnapshot {
    pub id: BlockId,
    pub kind: BlockKind,
    pub reachable: bool,
    pub successors: Vec<(BlockId, EdgeKind)>,
    pub phis: Vec<DefId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UseSnapshot {
    pub id: UseId,
    pub location: String,
    pub point: ProgramPoint,
    /// Definition in the graph, possibly a Phi
    pub reaching: Option<DefId>,
}
