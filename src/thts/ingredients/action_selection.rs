//! Action-selection ingredients (spec.md §4.2), grounded in PROST's
//! `-act` flag values (`examples/original_source/src/search/thts.cc`,
//! `setValueFromString`): `UniformActionSelection`, round-robin, and UCB1
//! with a choice of exploration-rate schedule.

use rand::Rng;
use rand::RngCore;

use super::Ingredient;
use crate::thts::node::NodeIndex;
use crate::thts::pool::NodePool;
use crate::UCB1_DEFAULT_EXPLORATION_WEIGHT;

/// candidates `selectAction` may return. spec.md §4.2 requires the chosen
/// child to "exist and not be solved" (the original asserts
/// `!node->children[appliedActionIndex]->solved`); a chance child can be
/// solved while its decision-node parent stays unsolved (other arms still
/// open), so solved children must be excluded here, not just empty slots.
fn applicable_children(pool: &NodePool, node: NodeIndex) -> Vec<(usize, NodeIndex)> {
    pool.get(node)
        .children
        .iter()
        .enumerate()
        .filter_map(|(i, c)| c.map(|idx| (i, idx)))
        .filter(|(_, idx)| !pool.get(*idx).solved)
        .collect()
}

/// picks uniformly at random among applicable children every visit.
pub struct UniformActionSelection;

impl Ingredient for UniformActionSelection {}

impl super::ActionSelection for UniformActionSelection {
    fn select_action(
        &mut self,
        pool: &NodePool,
        node: NodeIndex,
        _qvalue_mean: &[f64],
        rng: &mut dyn RngCore,
    ) -> usize {
        let children = applicable_children(pool, node);
        assert!(!children.is_empty(), "no applicable action at a non-leaf decision node");
        let pick = rng.random_range(0..children.len());
        children[pick].0
    }
}

/// visits the least-visited applicable child, cycling through all of them
/// before ever repeating one.
#[derive(Default)]
pub struct RoundRobinActionSelection;

impl Ingredient for RoundRobinActionSelection {}

impl super::ActionSelection for RoundRobinActionSelection {
    fn select_action(
        &mut self,
        pool: &NodePool,
        node: NodeIndex,
        _qvalue_mean: &[f64],
        _rng: &mut dyn RngCore,
    ) -> usize {
        let children = applicable_children(pool, node);
        assert!(!children.is_empty(), "no applicable action at a non-leaf decision node");
        children
            .into_iter()
            .min_by_key(|(_, idx)| pool.get(*idx).number_of_visits)
            .map(|(action, _)| action)
            .unwrap()
    }
}

/// the exploration-rate schedule for UCB1, matching the `-act UCB1 -ecf ...`
/// variants PROST accepts.
#[derive(Debug, Clone, Copy)]
pub enum ExplorationRate {
    Log,
    Sqrt,
    Lin,
    LogQuad,
}

impl ExplorationRate {
    fn rate(self, parent_visits: f64) -> f64 {
        match self {
            ExplorationRate::Log => parent_visits.max(1.0).ln(),
            ExplorationRate::Sqrt => parent_visits.max(1.0).sqrt(),
            ExplorationRate::Lin => parent_visits.max(1.0),
            ExplorationRate::LogQuad => parent_visits.max(1.0).sqrt().exp(),
        }
    }
}

/// classic UCB1: visit any never-visited applicable child first, then
/// maximize `value + explorationWeight * sqrt(rate(N) / n_child)`.
pub struct Ucb1ActionSelection {
    /// fallback exploration weight used when the parent node's own
    /// `|immediateReward + futureReward|` is exactly zero (spec.md §4.2).
    pub exploration_weight_fallback: f64,
    pub exploration_rate: ExplorationRate,
    /// if true, pick uniformly at the root instead of by UCB1 score, to
    /// avoid biasing the recommended action toward early exploration
    /// noise.
    pub uniform_at_root: bool,
}

impl Ucb1ActionSelection {
    pub fn new(exploration_rate: ExplorationRate) -> Self {
        Self {
            exploration_weight_fallback: UCB1_DEFAULT_EXPLORATION_WEIGHT,
            exploration_rate,
            uniform_at_root: false,
        }
    }

    /// spec.md §4.2: the exploration weight defaults to the parent node's
    /// own `|immediateReward + futureReward|`, degrading to a fixed
    /// constant only when that is exactly zero (an uninitialized or
    /// genuinely zero-value node gives UCB1 no useful scale to explore by).
    fn exploration_weight(&self, pool: &NodePool, node: NodeIndex) -> f64 {
        let parent = pool.get(node);
        let future_reward = if parent.future_reward.is_finite() { parent.future_reward } else { 0.0 };
        let raw = (parent.immediate_reward + future_reward).abs();
        if raw != 0.0 {
            raw
        } else {
            self.exploration_weight_fallback
        }
    }
}

impl Ingredient for Ucb1ActionSelection {}

impl super::ActionSelection for Ucb1ActionSelection {
    fn select_action(
        &mut self,
        pool: &NodePool,
        node: NodeIndex,
        qvalue_mean: &[f64],
        rng: &mut dyn RngCore,
    ) -> usize {
        let children = applicable_children(pool, node);
        assert!(!children.is_empty(), "no applicable action at a non-leaf decision node");

        if self.uniform_at_root && node == NodeIndex(0) {
            let pick = rng.random_range(0..children.len());
            return children[pick].0;
        }

        if let Some((action, _)) = children
            .iter()
            .find(|(_, idx)| pool.get(*idx).number_of_visits == 0)
        {
            return *action;
        }

        let parent_visits = pool.get(node).number_of_visits as f64;
        let rate = self.exploration_rate.rate(parent_visits);
        let exploration_weight = self.exploration_weight(pool, node);

        children
            .into_iter()
            .map(|(action, idx)| {
                let child = pool.get(idx);
                let value = child.expected_reward_estimate(qvalue_mean);
                let bonus = exploration_weight * (rate / child.number_of_visits as f64).sqrt();
                (action, value + bonus)
            })
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).expect("NaN in UCB1 score"))
            .map(|(action, _)| action)
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thts::ingredients::ActionSelection;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn tree_with_two_actions() -> (NodePool, NodeIndex) {
        let mut pool = NodePool::new(10);
        let root = pool.create_root_node(3);
        let a = pool.create_decision_node(1.0, 1.0, 2);
        let b = pool.create_decision_node(1.0, 2.0, 2);
        pool.get_mut(root).children = vec![Some(a), Some(b)];
        (pool, root)
    }

    #[test]
    fn round_robin_prefers_unvisited_child() {
        let (mut pool, root) = tree_with_two_actions();
        let b = pool.get(root).children[1].unwrap();
        pool.get_mut(b).number_of_visits = 3;
        let mut rr = RoundRobinActionSelection;
        let mut rng = SmallRng::seed_from_u64(1);
        let action = rr.select_action(&pool, root, &[], &mut rng);
        assert_eq!(action, 0);
    }

    #[test]
    fn ucb1_visits_unvisited_child_before_scoring() {
        let (mut pool, root) = tree_with_two_actions();
        let a = pool.get(root).children[0].unwrap();
        pool.get_mut(a).number_of_visits = 5;
        let mut ucb1 = Ucb1ActionSelection::new(ExplorationRate::Sqrt);
        let mut rng = SmallRng::seed_from_u64(2);
        let action = ucb1.select_action(&pool, root, &[], &mut rng);
        assert_eq!(action, 1);
    }

    #[test]
    fn ucb1_exploration_weight_falls_back_to_constant_when_parent_value_is_zero() {
        let (mut pool, root) = tree_with_two_actions();
        // a fresh root has immediate_reward 0.0 and an uninitialized
        // (non-finite) future_reward, so the effective parent value is
        // zero and the weight must fall back to the constant.
        let ucb1 = Ucb1ActionSelection::new(ExplorationRate::Sqrt);
        let weight = ucb1.exploration_weight(&pool, root);
        assert_eq!(weight, UCB1_DEFAULT_EXPLORATION_WEIGHT);

        pool.get_mut(root).immediate_reward = -3.5;
        let weight = ucb1.exploration_weight(&pool, root);
        assert_eq!(weight, 3.5, "weight tracks |immediateReward + futureReward| of the parent");
    }
}
