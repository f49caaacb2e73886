//! Per-procedure result

use crate::errors::MemssaError;
use crate::features::reaching_defs::{Initialization, ReachingDefinitions};
use crate::features::ssa::infrastructure::MemorySsa;
use crate::shared::models::{DefId, UseId};

#[derive(Debug)]
pub enum ProcedureOutcome {
    Analyzed(MemorySsa),
    /// Structural error; queries answer `Unknown` / empty
    Unanalyzable { name: String, error: MemssaError },
}

impl ProcedureOutcome {
    pub fn name(&self) -> &str {
        match self {
            ProcedureOutcome::Analyzed(ssa) => ssa.name(),
            ProcedureOutcome::Unanalyzable { name, .. } => name,
        }
    }

    pub fn is_analyzed(&self) -> bool {
        matches!(self, ProcedureOutcome::Analyzed(_))
    }

    pub fn ssa(&self) -> Option<&MemorySsa> {
        match self {
            ProcedureOutcome::Analyzed(ssa) => Some(ssa),
            ProcedureOutcome::Unanalyzable { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&MemssaError> {
        match self {
            ProcedureOutcome::Analyzed(_) => None,
            ProcedureOutcome::Unanalyzable { error, .. } => Some(error),
        }
    }

    pub fn into_ssa(self) -> Result<MemorySsa, MemssaError> {
        match self {
            ProcedureOutcome::Analyzed(ssa) => Ok(ssa),
            ProcedureOutcome::Unanalyzable { error, .. } => Err(error),
        }
    }
}

impl ReachingDefinitions for ProcedureOutcome {
    fn definitions_reaching(&self, use_id: UseId) -> Vec<DefId> {
        self.ssa()
            .map(|ssa| ssa.definitions_reaching(use_id))
            .unwrap_or_default()
    }

    fn initialization(&self, use_id: UseId) -> Initialization {
        self.ssa()
            .map_or(Initialization::Unknown, |ssa| ssa.initialization(use_id))
    }
}
