//! Flow Graph infrastructure

pub mod cfg_builder;
pub mod dominators;

pub use cfg_builder::{build_cfg, CfgError, CfgResult};
pub use dominators::DominatorTree;
