//! Initializer ingredients (spec.md §4.2), grounded in PROST's `-init`
//! flag values: expand an unexpanded decision node by creating one
//! chance-node child per applicable action, seeded with a prior estimate.

use super::Ingredient;
use crate::thts::node::NodeIndex;
use crate::thts::pool::NodePool;

/// seeds every applicable action's prior with the same constant per-step
/// reward rate `q0`, scaled by the remaining horizon — PROST's simplest
/// `-init` variant.
pub struct UniformInitializer {
    pub q0: f64,
}

impl Ingredient for UniformInitializer {}

impl super::Initializer for UniformInitializer {
    fn initialize(&mut self, pool: &mut NodePool, node: NodeIndex, applicable: &[bool], horizon_factor: f64) {
        let steps_to_go = pool.get(node).steps_to_go;
        let mut children = vec![None; applicable.len()];
        for (action, &is_applicable) in applicable.iter().enumerate() {
            if !is_applicable {
                continue;
            }
            let chance = pool.create_chance_node(1.0, steps_to_go, true);
            pool.get_mut(chance).future_reward = horizon_factor * self.q0;
            children[action] = Some(chance);
        }
        let node_mut = pool.get_mut(node);
        node_mut.children = children;
        node_mut.initialized = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thts::ingredients::Initializer;

    #[test]
    fn only_applicable_actions_get_children() {
        let mut pool = NodePool::new(10);
        let root = pool.create_root_node(3);
        let mut init = UniformInitializer { q0: 1.0 };
        init.initialize(&mut pool, root, &[true, false, true], 3.0);
        let node = pool.get(root);
        assert!(node.initialized);
        assert!(node.children[0].is_some());
        assert!(node.children[1].is_none());
        assert!(node.children[2].is_some());
        let seeded = pool.get(node.children[0].unwrap());
        assert_eq!(seeded.future_reward, 3.0);
    }
}
