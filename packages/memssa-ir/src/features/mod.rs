//! Feature modules - Each feature follows Hexagonal Architecture
//!
//! Each feature contains (as needed):
//! - domain/     - Pure model and logic
//! - ports/      - Interface definitions (traits)
//! - application/ - Use cases over built results
//! - infrastructure/ - Builders and analyses
//!
//! Leaves first: procedure → memory_model → flow_graph → escape_analysis →
//! ssa → reaching_defs.

pub mod escape_analysis;
pub mod flow_graph;
pub mod memory_model;
pub mod procedure;
pub mod reaching_defs;
pub mod ssa;
