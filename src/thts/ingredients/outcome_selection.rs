//! Outcome-selection ingredients (spec.md §4.2), grounded in PROST's
//! `-out` flag values: plain Monte Carlo sampling of a chance node's
//! successor-state distribution, and an unvisited-outcome-preferring
//! variant. Picks an outcome *index* only; the driver owns creating or
//! reusing the corresponding child node, since that requires state and
//! reward information the ingredient has no business touching.

use rand::Rng;
use rand::RngCore;

use super::Ingredient;
use crate::thts::node::NodeIndex;
use crate::thts::pool::NodePool;

/// samples an outcome by its probability mass.
pub struct MonteCarloOutcomeSelection;

impl Ingredient for MonteCarloOutcomeSelection {}

impl super::OutcomeSelection for MonteCarloOutcomeSelection {
    fn select_outcome(&mut self, _pool: &mut NodePool, _chance_node: NodeIndex, probs: &[f64], rng: &mut dyn RngCore) -> usize {
        assert!(!probs.is_empty(), "chance node with no outcomes");
        if probs.len() == 1 {
            return 0;
        }
        let mut roll: f64 = rng.random();
        for (i, prob) in probs.iter().enumerate() {
            roll -= prob;
            if roll <= 0.0 || i == probs.len() - 1 {
                return i;
            }
        }
        unreachable!("outcome distribution did not sum to 1.0")
    }
}

/// prefers any outcome slot that hasn't been visited yet, falling back to
/// Monte Carlo sampling once every outcome has at least one trial.
#[derive(Default)]
pub struct UnvisitedFirstOutcomeSelection {
    fallback: MonteCarloOutcomeSelection,
}

impl Default for MonteCarloOutcomeSelection {
    fn default() -> Self {
        MonteCarloOutcomeSelection
    }
}

impl Ingredient for UnvisitedFirstOutcomeSelection {}

impl super::OutcomeSelection for UnvisitedFirstOutcomeSelection {
    fn select_outcome(&mut self, pool: &mut NodePool, chance_node: NodeIndex, probs: &[f64], rng: &mut dyn RngCore) -> usize {
        let children = &pool.get(chance_node).children;
        for i in 0..probs.len() {
            if children.get(i).copied().flatten().is_none() {
                return i;
            }
        }
        self.fallback.select_outcome(pool, chance_node, probs, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thts::ingredients::OutcomeSelection;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn deterministic_outcome_always_picks_slot_zero() {
        let mut pool = NodePool::new(10);
        let chance = pool.create_chance_node(1.0, 2, true);
        let mut mc = MonteCarloOutcomeSelection;
        let mut rng = SmallRng::seed_from_u64(7);
        let outcome = mc.select_outcome(&mut pool, chance, &[1.0], &mut rng);
        assert_eq!(outcome, 0);
    }

    #[test]
    fn unvisited_first_exhausts_every_slot_before_resampling() {
        let mut pool = NodePool::new(10);
        let chance = pool.create_chance_node(1.0, 2, true);
        let child0 = pool.create_decision_node(0.5, 0.0, 1);
        pool.get_mut(chance).children = vec![Some(child0)];
        let mut sel = UnvisitedFirstOutcomeSelection::default();
        let mut rng = SmallRng::seed_from_u64(9);
        let picked = sel.select_outcome(&mut pool, chance, &[0.5, 0.5], &mut rng);
        assert_eq!(picked, 1, "slot 0 is already populated, slot 1 must be preferred");
    }
}
