/*
 * memssa-ir - Memory-aware SSA per procedure
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : Dense ids, precision notes
 * - features/    : Vertical slices (procedure → flow graph → memory model
 *                  ∥ escape analysis → ssa → reaching definitions)
 * - pipeline/    : Per-procedure and batch orchestration
 * - config/      : AnalysisConfig (YAML)
 *
 * Parallelism:
 * - Procedures fan out over the rayon pool
 * - Location table and escape analysis of one procedure run under rayon::join
 */

#![allow(clippy::new_without_default)] // Default impl not always needed
#![allow(clippy::module_inception)] // Module naming intentional
#![allow(clippy::upper_case_acronyms)] // SSA, CFG naming

/// Shared models and utilities
pub mod shared;

/// Feature modules
pub mod features;

/// Pipeline orchestration
pub mod pipeline;

/// Configuration system
pub mod config;

/// Error types
pub mod errors;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports for Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use config::AnalysisConfig;
pub use errors::{MemssaError, Result};
pub use features::escape_analysis::{CallSiteRecord, EscapeState};
pub use features::flow_graph::{build_cfg, Cfg, CfgError, Operation};
pub use features::memory_model::{classify, AbstractLocation, LocationRoot, Overlap, PathElem};
pub use features::procedure::{Expr, Procedure, Stmt, StructDef, Type, TypeTable};
pub use features::reaching_defs::{Initialization, ReachingDefinitions};
pub use features::ssa::{ChiCause, DefKind, DefSite, Definition, MemorySsa};
pub use pipeline::{analyze_batch, analyze_procedure, ProcedureOutcome};
pub use shared::models::{BlockId, DefId, LocId, NoteReason, PrecisionNote, ProgramPoint, UseId};
