//! Dominator tree, dominance frontiers and traversal orders
//!
//! Immediate dominators come from petgraph's Cooper-Harvey-Kennedy
//! implementation over the reachable sub-graph. Frontiers use the same
//! paper's runner walk; iterated frontiers drive Phi placement.

use petgraph::algo::dominators::simple_fast;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::DfsPostOrder;

use crate::features::flow_graph::domain::Cfg;
use crate::shared::models::BlockId;

#[derive(Debug, Clone)]
pub struct DominatorTree {
    idom: Vec<Option<BlockId>>,
    children: Vec<Vec<BlockId>>,
    frontiers: Vec<Vec<BlockId>>,
    rpo: Vec<BlockId>,
    rpo_index: Vec<Option<usize>>,
}

impl DominatorTree {
    pub fn compute(cfg: &Cfg) -> Self {
        let n = cfg.len();

        // Reachable sub-graph only
        let mut graph: DiGraph<BlockId, ()> = DiGraph::new();
        let mut node_of: Vec<Option<NodeIndex>> = vec![None; n];
        for block in cfg.reachable_blocks() {
            node_of[block.id.index()] = Some(graph.add_node(block.id));
        }
        for block in cfg.reachable_blocks() {
            if let Some(from) = node_of[block.id.index()] {
                for target in block.successor_ids() {
                    if let Some(to) = node_of[target.index()] {
                        graph.add_edge(from, to, ());
                    }
                }
            }
        }

        let mut idom = vec![None; n];
        let mut rpo = Vec::with_capacity(graph.node_count());
        if let Some(root) = node_of[Cfg::ENTRY.index()] {
            let dominators = simple_fast(&graph, root);
            for node in graph.node_indices() {
                if let Some(parent) = dominators.immediate_dominator(node) {
                    idom[graph[node].index()] = Some(graph[parent]);
                }
            }

            let mut dfs = DfsPostOrder::new(&graph, root);
            while let Some(node) = dfs.next(&graph) {
                rpo.push(graph[node]);
            }
            rpo.reverse();
        }

        let mut rpo_index = vec![None; n];
        for (position, block) in rpo.iter().enumerate() {
            rpo_index[block.index()] = Some(position);
        }

        // Children in reverse postorder
        let mut children = vec![Vec::new(); n];
        for block in &rpo {
            if let Some(parent) = idom[block.index()] {
                children[parent.index()].push(*block);
            }
        }

        let mut tree = Self {
            idom,
            children,
            frontiers: vec![Vec::new(); n],
            rpo,
            rpo_index,
        };
        tree.compute_frontiers(cfg);
        tree
    }

    fn compute_frontiers(&mut self, cfg: &Cfg) {
        for block in &self.rpo {
            let preds = cfg.reachable_predecessors(*block);
            if preds.len() < 2 {
                continue;
            }
            let Some(stop) = self.idom[block.index()] else {
                continue;
            };
            for pred in preds {
                let mut runner = pred;
                while runner != stop {
                    let frontier = &mut self.frontiers[runner.index()];
                    if !frontier.contains(block) {
                        frontier.push(*block);
                    }
                    match self.idom[runner.index()] {
                        Some(parent) => runner = parent,
                        None => break,
                    }
                }
            }
        }
    }

    pub fn idom(&self, block: BlockId) -> Option<BlockId> {
        self.idom.get(block.index()).copied().flatten()
    }

    pub fn children(&self, block: BlockId) -> &[BlockId] {
        self.children
            .get(block.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn frontier(&self, block: BlockId) -> &[BlockId] {
        self.frontiers
            .get(block.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Reachable blocks in reverse postorder from entry
    pub fn reverse_postorder(&self) -> &[BlockId] {
        &self.rpo
    }

    pub fn rpo_position(&self, block: BlockId) -> Option<usize> {
        self.rpo_index.get(block.index()).copied().flatten()
    }

    /// `a` dominates `b` (reflexive); false for unreachable blocks
    pub fn dominates(&self, a: BlockId, b: BlockId) -> bool {
        if self.rpo_position(a).is_none() || self.rpo_position(b).is_none() {
            return false;
        }
        let mut current = Some(b);
        while let Some(block) = current {
            if block == a {
                return true;
            }
            current = self.idom(block);
        }
        false
    }

    /// Dominator-tree preorder with children in reverse postorder
    pub fn preorder(&self) -> Vec<BlockId> {
        let mut order = Vec::with_capacity(self.rpo.len());
        let mut stack: Vec<BlockId> = self.rpo.first().copied().into_iter().collect();
        while let Some(block) = stack.pop() {
            order.push(block);
            stack.extend(self.children(block).iter().rev());
        }
        order
    }

    /// Iterated dominance frontier of a set of blocks, in block order
    pub fn iterated_frontier(&self, blocks: impl IntoIterator<Item = BlockId>) -> Vec<BlockId> {
        let mut in_result = vec![false; self.frontiers.len()];
        let mut queued = vec![false; self.frontiers.len()];
        let mut worklist = Vec::new();
        for block in blocks {
            if let Some(flag) = queued.get_mut(block.index()) {
                if !*flag {
                    *flag = true;
                    worklist.push(block);
                }
            }
        }

        while let Some(block) = worklist.pop() {
            for &frontier in self.frontier(block) {
                if !in_result[frontier.index()] {
                    in_result[frontier.index()] = true;
                    if !queued[frontier.index()] {
                        queued[frontier.index()] = true;
                        worklist.push(frontier);
                    }
                }
            }
        }

        in_result
            .iter()
            .enumerate()
            .filter_map(|(index, placed)| placed.then(|| BlockId::new(index)))
            .collect()
    }
}
