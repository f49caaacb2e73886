//! Pipeline orchestration
//!
//! Procedure → flow graph → (location table ∥ escape summary) → memory SSA.
//! Procedures are independent; a batch fans them out over the rayon pool.

pub mod outcome;
pub mod processor;

pub use outcome::ProcedureOutcome;
pub use processor::{analyze_batch, analyze_procedure};
