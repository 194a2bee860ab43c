//! Recommendation ingredients (spec.md §4.2), grounded in PROST's default
//! `-rec` value, `ExpectedBestArmRecommendation`: after the trial budget is
//! spent, recommend the root's child with the highest expected value
//! (ties broken by visit count, the way PROST prefers the better-sampled
//! arm among near-equal estimates).

use super::Ingredient;
use crate::thts::node::NodeIndex;
use crate::thts::pool::NodePool;

pub struct ExpectedBestArmRecommendation;

impl Ingredient for ExpectedBestArmRecommendation {}

impl super::RecommendationFunction for ExpectedBestArmRecommendation {
    fn recommend(&mut self, pool: &NodePool, root: NodeIndex, qvalue_mean: &[f64]) -> usize {
        pool.get(root)
            .children
            .iter()
            .enumerate()
            .filter_map(|(action, c)| c.map(|idx| (action, idx)))
            .map(|(action, idx)| {
                let child = pool.get(idx);
                (action, child.expected_reward_estimate(qvalue_mean), child.number_of_visits)
            })
            .max_by(|(_, va, na), (_, vb, nb)| {
                va.partial_cmp(vb)
                    .expect("NaN in recommendation score")
                    .then(na.cmp(nb))
            })
            .map(|(action, _, _)| action)
            .expect("root must have at least one applicable action")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thts::ingredients::RecommendationFunction;

    #[test]
    fn picks_highest_expected_value_child() {
        let mut pool = NodePool::new(10);
        let root = pool.create_root_node(2);
        let a = pool.create_chance_node(1.0, 1, true);
        let b = pool.create_chance_node(1.0, 1, true);
        pool.get_mut(a).future_reward = 1.0;
        pool.get_mut(b).future_reward = 2.0;
        pool.get_mut(root).children = vec![Some(a), Some(b)];
        let mut rec = ExpectedBestArmRecommendation;
        let action = rec.recommend(&pool, root, &[]);
        assert_eq!(action, 1);
    }
}
