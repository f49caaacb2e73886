//! Control flow graph feature
//!
//! Lowering of a procedure into basic blocks of memory operations, plus the
//! dominance information SSA construction needs.

pub mod domain;
pub mod infrastructure;

pub use domain::{BasicBlock, BlockKind, Cfg, Edge, EdgeKind, Operation, StoreKind, UseSite};
pub use infrastructure::{build_cfg, CfgError, CfgResult, DominatorTree};
