//! Memory SSA construction
//!
//! Phi nodes at merges, Chi nodes at partial and indirect writes, one
//! reaching definition per use.

pub mod domain;
pub mod infrastructure;

pub use domain::{ChiCause, DefKind, DefSite, Definition, SsaGraph};
pub use infrastructure::{build_memory_ssa, MemorySsa, SsaError, SsaResult, SsaSnapshot};
