//! SSA infrastructure

pub mod effects;
pub mod errors;
pub mod memory_ssa;
pub mod memory_ssa_builder;

pub use effects::{Effect, EffectMap};
pub use errors::{SsaError, SsaResult};
pub use memory_ssa::{BlockSnapshot, MemorySsa, SsaSnapshot, UseSnapshot};
pub use memory_ssa_builder::build_memory_ssa;
