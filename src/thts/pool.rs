//! The node pool: bump-allocated arena with in-place reuse, grounded in
//! PROST's `createRootNode`/`createDecisionNode`/`createChanceNode`
//! (`examples/original_source/src/search/thts.cc`). The original grows a
//! `std::vector<SearchNode*>` lazily and resets individual slots in place to
//! avoid per-trial heap churn; this realizes the same idea as a flat
//! `Vec<SearchNode>` addressed by `NodeIndex`.

use super::node::{NodeIndex, SearchNode};

/// Absorbed between two termination checks so a single trial never runs out
/// of pool slots mid-expansion (spec.md §4.1).
pub const NODE_POOL_SLACK: usize = crate::NODE_POOL_SLACK;

pub struct NodePool {
    nodes: Vec<SearchNode>,
    max_number_of_nodes: usize,
    last_used_index: usize,
}

impl NodePool {
    pub fn new(max_number_of_nodes: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(max_number_of_nodes + NODE_POOL_SLACK),
            max_number_of_nodes,
            last_used_index: 0,
        }
    }

    pub fn max_number_of_nodes(&self) -> usize {
        self.max_number_of_nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn last_used_index(&self) -> usize {
        self.last_used_index
    }

    /// number of slots left before the pool (including slack) is exhausted.
    pub fn remaining_capacity(&self) -> usize {
        (self.max_number_of_nodes + NODE_POOL_SLACK).saturating_sub(self.last_used_index)
    }

    pub fn is_exhausted(&self) -> bool {
        self.last_used_index >= self.max_number_of_nodes + NODE_POOL_SLACK
    }

    /// true once the pool has reached the user-configured cap. spec.md §4.1
    /// names `lastUsedNodePoolIndex ≥ maxNumberOfNodes` as the sole hard
    /// stop for the driver's trial loop; the slack `is_exhausted` adds on
    /// top only absorbs overruns within a single in-flight trial and must
    /// not raise the cap the outer loop enforces.
    pub fn is_at_node_limit(&self) -> bool {
        self.last_used_index >= self.max_number_of_nodes
    }

    pub fn get(&self, index: NodeIndex) -> &SearchNode {
        &self.nodes[index.0]
    }

    pub fn get_mut(&mut self, index: NodeIndex) -> &mut SearchNode {
        &mut self.nodes[index.0]
    }

    /// start a new search round: clear any leftover children lists in
    /// previously-used slots, then reuse slot 0 as the root. Mirrors
    /// PROST's `createRootNode`, which walks the pool clearing children
    /// before reusing index 0.
    pub fn create_root_node(&mut self, steps_to_go: usize) -> NodeIndex {
        for node in self.nodes.iter_mut().take(self.last_used_index) {
            node.children.clear();
        }
        if self.nodes.is_empty() {
            self.nodes.push(SearchNode::new_decision(1.0, 0.0, steps_to_go));
        } else {
            self.nodes[0].reset_as_decision(1.0, 0.0, steps_to_go);
        }
        self.last_used_index = 1;
        NodeIndex(0)
    }

    fn acquire(&mut self) -> NodeIndex {
        assert!(
            self.last_used_index < self.max_number_of_nodes + NODE_POOL_SLACK,
            "node pool exhausted"
        );
        let index = self.last_used_index;
        self.last_used_index += 1;
        if index < self.nodes.len() {
            // slot already allocated from a previous round; reset happens
            // in the caller via reset_as_* to keep this function kind-agnostic.
        } else {
            self.nodes.push(SearchNode::new_decision(0.0, 0.0, 0));
        }
        NodeIndex(index)
    }

    pub fn create_decision_node(
        &mut self,
        prob: f64,
        immediate_reward: f64,
        steps_to_go: usize,
    ) -> NodeIndex {
        let index = self.acquire();
        self.nodes[index.0].reset_as_decision(prob, immediate_reward, steps_to_go);
        index
    }

    pub fn create_chance_node(
        &mut self,
        prob: f64,
        steps_to_go: usize,
        is_action_node: bool,
    ) -> NodeIndex {
        let index = self.acquire();
        self.nodes[index.0].reset_as_chance(prob, steps_to_go, is_action_node);
        index
    }

    /// all slots touched during the current round, in allocation order —
    /// the multiset the equivalence-class builder walks (spec.md §4.4,
    /// Open Question (a): nodes enter the abstraction set at both
    /// initialize time and solve time, which in this arena means simply
    /// "every slot allocated so far this round").
    pub fn allocated(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        (0..self.last_used_index).map(NodeIndex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_reuses_slot_zero() {
        let mut pool = NodePool::new(10);
        let root1 = pool.create_root_node(5);
        assert_eq!(root1, NodeIndex(0));
        pool.create_decision_node(1.0, 0.0, 4);
        let root2 = pool.create_root_node(5);
        assert_eq!(root2, NodeIndex(0));
        assert_eq!(pool.last_used_index(), 1);
    }

    #[test]
    fn exhaustion_panics() {
        let mut pool = NodePool::new(0);
        pool.create_root_node(1);
        for _ in 0..NODE_POOL_SLACK - 1 {
            pool.create_decision_node(1.0, 0.0, 0);
        }
        assert!(pool.is_exhausted());
    }
}
