//! Control flow graph of one procedure
//!
//! Blocks own their primitive memory operations. Block `bb0` is the entry,
//! `bb1` the synthesized exit. Edges are stored on both ends; predecessor
//! lists may contain unreachable blocks, consumers filter with
//! [`Cfg::reachable_predecessors`].

use serde::{Deserialize, Serialize};

use crate::features::memory_model::domain::AbstractLocation;
use crate::features::procedure::domain::Scope;
use crate::shared::models::{BlockId, PrecisionNote, ProgramPoint, UseId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    Sequential,
    TrueBranch,
    FalseBranch,
    LoopBack,
    /// `goto`, `break`, `continue`
    Jump,
    /// Switch dispatch to a `case`/`default` label
    Case,
    Return,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub target: BlockId,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    Entry,
    Exit,
    Body,
    Condition,
    LoopHeader,
    Join,
    Label,
    SwitchCase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreKind {
    /// `x = v`
    Assign,
    /// Declaration initializer
    Init,
    /// `x += v`, `x++`: reads the old value first
    Update,
}

/// Primitive memory operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Load {
        location: AbstractLocation,
        use_id: UseId,
    },
    Store {
        location: AbstractLocation,
        kind: StoreKind,
        /// The target could not be resolved precisely: the write may leave
        /// parts of the location untouched
        weak: bool,
    },
    /// Aggregate assignment `dst = src`
    Copy {
        dst: AbstractLocation,
        src: AbstractLocation,
    },
    AddressTaken {
        location: AbstractLocation,
    },
    Call {
        callee: String,
        pure: bool,
        /// Addresses appearing in the arguments, in argument order
        arg_addresses: Vec<AbstractLocation>,
    },
    /// Inline assembly and other side effects nothing is known about
    Opaque {
        operands: Vec<AbstractLocation>,
    },
}

impl Operation {
    /// Every location the operation mentions
    pub fn locations(&self) -> Vec<&AbstractLocation> {
        match self {
            Operation::Load { location, .. }
            | Operation::Store { location, .. }
            | Operation::AddressTaken { location } => vec![location],
            Operation::Copy { dst, src } => vec![dst, src],
            Operation::Call { arg_addresses, .. } => arg_addresses.iter().collect(),
            Operation::Opaque { operands } => operands.iter().collect(),
        }
    }

    /// Call or opaque operation that may write any escaped memory
    pub fn clobbers_escaped(&self) -> bool {
        matches!(
            self,
            Operation::Call { pure: false, .. } | Operation::Opaque { .. }
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicBlock {
    pub id: BlockId,
    pub kind: BlockKind,
    pub ops: Vec<Operation>,
    pub predecessors: Vec<BlockId>,
    pub successors: Vec<Edge>,
    pub reachable: bool,
}

impl BasicBlock {
    pub fn new(id: BlockId, kind: BlockKind) -> Self {
        Self {
            id,
            kind,
            ops: Vec::new(),
            predecessors: Vec::new(),
            successors: Vec::new(),
            reachable: false,
        }
    }

    pub fn successor_ids(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.successors.iter().map(|edge| edge.target)
    }
}

/// A read of a location at a program point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UseSite {
    pub id: UseId,
    pub location: AbstractLocation,
    pub point: ProgramPoint,
}

#[derive(Debug, Clone)]
pub struct Cfg {
    pub name: String,
    pub blocks: Vec<BasicBlock>,
    pub uses: Vec<UseSite>,
    pub scope: Scope,
    pub notes: Vec<PrecisionNote>,
}

impl Cfg {
    pub const ENTRY: BlockId = BlockId(0);
    pub const EXIT: BlockId = BlockId(1);

    pub fn entry(&self) -> BlockId {
        Self::ENTRY
    }

    pub fn exit(&self) -> BlockId {
        Self::EXIT
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(id.index())
    }

    pub fn is_reachable(&self, id: BlockId) -> bool {
        self.block(id).map_or(false, |block| block.reachable)
    }

    pub fn reachable_blocks(&self) -> impl Iterator<Item = &BasicBlock> + '_ {
        self.blocks.iter().filter(|block| block.reachable)
    }

    /// Predecessors that are themselves reachable, in edge insertion order
    ///
    /// Phi operand slots follow this order.
    pub fn reachable_predecessors(&self, id: BlockId) -> Vec<BlockId> {
        self.block(id)
            .map(|block| {
                block
                    .predecessors
                    .iter()
                    .copied()
                    .filter(|pred| self.is_reachable(*pred))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn use_site(&self, id: UseId) -> Option<&UseSite> {
        self.uses.get(id.index())
    }

    /// Every operation of reachable blocks with its program point
    pub fn reachable_ops(&self) -> impl Iterator<Item = (ProgramPoint, &Operation)> + '_ {
        self.reachable_blocks().flat_map(|block| {
            block
                .ops
                .iter()
                .enumerate()
                .map(move |(index, op)| (ProgramPoint::new(block.id, index), op))
        })
    }

    pub fn edge_count(&self) -> usize {
        self.blocks.iter().map(|block| block.successors.len()).sum()
    }
}
