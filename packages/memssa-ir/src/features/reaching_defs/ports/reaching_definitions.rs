use crate::features::reaching_defs::domain::Initialization;
use crate::shared::models::{DefId, UseId};

/// Reaching-definition queries for the uses of one procedure
///
/// Implementations are read-only and may be shared across threads.
pub trait ReachingDefinitions: Send + Sync {
    /// Definitions reaching `use_id` with Phi nodes flattened, ordered by id
    ///
    /// Never empty for a reachable use; empty for a use in an unreachable
    /// block or an unknown use.
    fn definitions_reaching(&self, use_id: UseId) -> Vec<DefId>;

    fn initialization(&self, use_id: UseId) -> Initialization;

    fn is_definitely_initialized(&self, use_id: UseId) -> bool {
        self.initialization(use_id).is_definitely_initialized()
    }
}
