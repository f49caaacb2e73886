//! Query API over a built memory SSA

use crate::features::escape_analysis::EscapeState;
use crate::features::memory_model::domain::AbstractLocation;
use crate::features::reaching_defs::domain::{flatten_phis, value_facts, Initialization};
use crate::features::reaching_defs::ports::ReachingDefinitions;
use crate::features::ssa::domain::Definition;
use crate::features::ssa::infrastructure::MemorySsa;
use crate::shared::models::{BlockId, DefId, UseId};

impl ReachingDefinitions for MemorySsa {
    fn definitions_reaching(&self, use_id: UseId) -> Vec<DefId> {
        match self.graph.use_def(use_id) {
            Some(def) => flatten_phis(&self.graph, def),
            None => Vec::new(),
        }
    }

    fn initialization(&self, use_id: UseId) -> Initialization {
        let Some(site) = self.cfg.use_site(use_id) else {
            return Initialization::Unknown;
        };
        if !self.cfg.is_reachable(site.point.block) {
            return Initialization::Unreachable;
        }
        match self.graph.use_def(use_id) {
            Some(def) => value_facts(&self.graph, def).classify(),
            None => Initialization::Unknown,
        }
    }
}

impl MemorySsa {
    /// Uses of the location whose display form is `name`, in program order
    pub fn uses_of(&self, name: &str) -> Vec<UseId> {
        self.cfg
            .uses
            .iter()
            .filter(|site| site.location.to_string() == name)
            .map(|site| site.id)
            .collect()
    }

    pub fn location_of(&self, use_id: UseId) -> Option<&AbstractLocation> {
        self.cfg.use_site(use_id).map(|site| &site.location)
    }

    pub fn is_block_reachable(&self, block: BlockId) -> bool {
        self.cfg.is_reachable(block)
    }

    /// Escape state of the used location just before the use
    pub fn escape_state_at(&self, use_id: UseId) -> Option<EscapeState> {
        let site = self.cfg.use_site(use_id)?;
        if !self.cfg.is_reachable(site.point.block) {
            return None;
        }
        Some(self.escape.state_at(&self.cfg, site.point, &site.location))
    }

    /// Flattened reaching definitions, resolved
    pub fn reaching_definitions(&self, use_id: UseId) -> Vec<&Definition> {
        self.definitions_reaching(use_id)
            .into_iter()
            .filter_map(|id| self.graph.definition(id))
            .collect()
    }
}
