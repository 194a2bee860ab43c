//! The on-line equivalence-class builder (spec.md §4.4), reverse-engineered
//! from PROST's `generateEquivalenceClass`/`makeChildrenOnLevel`/`makeQmean`
//! (`examples/original_source/src/search/thts.cc`). Nodes touched since the
//! last rebuild are grouped bottom-up by a structural signature over their
//! children's already-assigned classes; each class's mean Q-value becomes
//! the value every member node reports until the next rebuild.
//!
//! Two idiomatic departures from the original, recorded in `DESIGN.md`:
//! the original encodes a sentinel `(-2, classId)` pair inside the same
//! `map<int,double>` it uses for signatures, to smuggle a second return
//! value out through one container; here a signature and its assigned
//! class id are carried as a plain tuple (`(BTreeMap<usize, f64>, usize)`)
//! instead. And ordering nodes "bottom-up" is realized as a `sort_by_key`
//! over the touched set rather than a `std::multiset` insert-ordered by a
//! partial comparator, since the effect — smallest `stepsToGo` first,
//! chance nodes before decision nodes at equal `stepsToGo` — is identical
//! and a stable sort is simpler to reason about than a live multiset.

use std::collections::BTreeMap;

use super::node::NodeIndex;
use super::pool::NodePool;

type Signature = BTreeMap<usize, f64>;

pub struct EquivalenceClasses {
    qvalue_sum: Vec<f64>,
    qvalue_count: Vec<u32>,
    qvalue_mean: Vec<f64>,
}

impl EquivalenceClasses {
    pub fn new() -> Self {
        Self {
            qvalue_sum: Vec::new(),
            qvalue_count: Vec::new(),
            qvalue_mean: Vec::new(),
        }
    }

    pub fn qvalue_mean(&self) -> &[f64] {
        &self.qvalue_mean
    }

    pub fn class_count(&self) -> usize {
        self.qvalue_sum.len()
    }

    fn open_class(&mut self) -> usize {
        self.qvalue_sum.push(0.0);
        self.qvalue_count.push(0);
        self.qvalue_sum.len() - 1
    }

    /// rebuild every class from scratch over every node touched so far this
    /// round. Resolves spec.md §9 Open Question (c): a rebuild always
    /// starts classes at zero rather than carrying counts across rebuilds.
    pub fn rebuild(&mut self, pool: &mut NodePool) {
        self.qvalue_sum.clear();
        self.qvalue_count.clear();
        self.qvalue_mean.clear();

        let mut nodes: Vec<NodeIndex> = pool.allocated().collect();
        nodes.sort_by_key(|&idx| {
            let node = pool.get(idx);
            (node.steps_to_go, !node.is_chance_node)
        });

        let mut leaf_layer: Option<(usize, bool)> = None;
        let mut leaf_class: usize = 0;
        let mut current_layer: Option<(usize, bool)> = None;
        let mut layer_signatures: Vec<(Signature, usize)> = Vec::new();

        for idx in nodes {
            let (steps_to_go, is_chance_node, is_leaf) = {
                let node = pool.get(idx);
                (node.steps_to_go, node.is_chance_node, node.is_a_leaf())
            };

            let class = if is_leaf {
                if !is_chance_node {
                    self.open_class()
                } else {
                    let layer = (steps_to_go, is_chance_node);
                    if leaf_layer != Some(layer) {
                        leaf_layer = Some(layer);
                        leaf_class = self.open_class();
                    }
                    leaf_class
                }
            } else {
                let layer = (steps_to_go, is_chance_node);
                if current_layer != Some(layer) {
                    current_layer = Some(layer);
                    layer_signatures.clear();
                }
                let signature = if is_chance_node {
                    chance_signature(pool, idx)
                } else {
                    decision_signature(pool, idx)
                };
                match layer_signatures.iter().find(|(sig, _)| *sig == signature) {
                    Some((_, class)) => *class,
                    None => {
                        let class = self.open_class();
                        layer_signatures.push((signature, class));
                        class
                    }
                }
            };

            let node = pool.get_mut(idx);
            node.equivalence_class = Some(class);
            self.qvalue_sum[class] += node.immediate_reward + node.future_reward;
            self.qvalue_count[class] += 1;
        }

        self.qvalue_mean = self
            .qvalue_sum
            .iter()
            .zip(&self.qvalue_count)
            .map(|(sum, count)| if *count > 0 { sum / (*count as f64) } else { 0.0 })
            .collect();
    }
}

impl Default for EquivalenceClasses {
    fn default() -> Self {
        Self::new()
    }
}

/// a decision node's signature: the multiset of its children's classes,
/// weighted by how many children share each class (PROST's
/// `makeChildrenOnLevel`, decision-node branch).
fn decision_signature(pool: &NodePool, idx: NodeIndex) -> Signature {
    let mut signature = Signature::new();
    for child in pool.get(idx).children.iter().flatten() {
        let class = pool
            .get(*child)
            .equivalence_class
            .expect("child must be classified before its parent");
        *signature.entry(class).or_insert(0.0) += 1.0;
    }
    signature
}

/// a chance node's signature: flatten through any nested chance children
/// (still-unresolved probabilistic fluents) down to decision-node
/// descendants, weighting each by cumulative path probability (PROST's
/// `collectAllDecisionNodeSuccessor` + `makeChildrenOnLevel`, chance-node
/// branch).
fn chance_signature(pool: &NodePool, idx: NodeIndex) -> Signature {
    let mut signature = Signature::new();
    flatten_chance_descendants(pool, idx, 1.0, &mut signature);
    signature
}

fn flatten_chance_descendants(pool: &NodePool, idx: NodeIndex, path_prob: f64, out: &mut Signature) {
    for child in pool.get(idx).children.iter().flatten() {
        let child_node = pool.get(*child);
        let weight = path_prob * child_node.prob;
        if child_node.is_chance_node {
            flatten_chance_descendants(pool, *child, weight, out);
        } else {
            let class = child_node
                .equivalence_class
                .expect("decision descendant must be classified before its chance ancestor");
            *out.entry(class).or_insert(0.0) += weight;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_decision(pool: &mut NodePool, steps_to_go: usize) -> NodeIndex {
        pool.create_decision_node(1.0, 1.0, steps_to_go)
    }

    #[test]
    fn isomorphic_leaf_decisions_share_no_class_when_childless() {
        // a decision node with zero children always opens its own class,
        // even when another identical-looking leaf was just processed.
        let mut pool = NodePool::new(10);
        pool.create_root_node(2);
        let a = leaf_decision(&mut pool, 1);
        let b = leaf_decision(&mut pool, 1);
        let mut classes = EquivalenceClasses::new();
        classes.rebuild(&mut pool);
        let ca = pool.get(a).equivalence_class.unwrap();
        let cb = pool.get(b).equivalence_class.unwrap();
        assert_ne!(ca, cb);
    }

    #[test]
    fn childless_decision_leaves_never_merge_even_under_identical_parents() {
        let mut pool = NodePool::new(10);
        pool.create_root_node(3);
        let leaf1 = leaf_decision(&mut pool, 1);
        let leaf2 = leaf_decision(&mut pool, 1);

        let chance_a = pool.create_chance_node(1.0, 2, true);
        pool.get_mut(chance_a).children = vec![Some(leaf1)];
        let chance_b = pool.create_chance_node(1.0, 2, true);
        pool.get_mut(chance_b).children = vec![Some(leaf2)];

        let mut classes = EquivalenceClasses::new();
        classes.rebuild(&mut pool);

        let class_leaf1 = pool.get(leaf1).equivalence_class.unwrap();
        let class_leaf2 = pool.get(leaf2).equivalence_class.unwrap();
        assert_ne!(class_leaf1, class_leaf2, "distinct childless decision leaves never merge");

        let class_a = pool.get(chance_a).equivalence_class.unwrap();
        let class_b = pool.get(chance_b).equivalence_class.unwrap();
        assert_ne!(
            class_a, class_b,
            "chance nodes pointing at distinct leaf classes must not merge"
        );
    }

    #[test]
    fn qvalue_mean_averages_member_rewards() {
        let mut pool = NodePool::new(10);
        pool.create_root_node(2);
        let a = pool.create_chance_node(1.0, 1, true);
        let b = pool.create_chance_node(1.0, 1, true);
        pool.get_mut(a).future_reward = 0.0;
        pool.get_mut(a).immediate_reward = 4.0;
        pool.get_mut(b).future_reward = 0.0;
        pool.get_mut(b).immediate_reward = 6.0;
        // both are childless chance-node leaves at the same layer: merge.
        let mut classes = EquivalenceClasses::new();
        classes.rebuild(&mut pool);
        let class_a = pool.get(a).equivalence_class.unwrap();
        let class_b = pool.get(b).equivalence_class.unwrap();
        assert_eq!(class_a, class_b);
        assert_eq!(classes.qvalue_mean()[class_a], 5.0);
    }
}
