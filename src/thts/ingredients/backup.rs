//! Backup ingredients (spec.md §4.2), grounded in PROST's `-backup` flag
//! values: Monte Carlo backup (running mean over visits), and a partial
//! Bellman backup that takes the max over applicable children instead of
//! averaging trial returns.

use super::Ingredient;
use crate::thts::node::NodeIndex;
use crate::thts::pool::NodePool;

fn applicable_children(pool: &NodePool, node: NodeIndex) -> Vec<NodeIndex> {
    pool.get(node).children.iter().filter_map(|c| *c).collect()
}

/// a chance node is solved once every outcome slot discovered so far is
/// solved. This under-approximates PROST's notion (it doesn't know how
/// many outcomes the full distribution has until every slot has been
/// populated at least once), documented as a simplification in DESIGN.md.
fn chance_node_solved(pool: &NodePool, node: NodeIndex) -> bool {
    let children = &pool.get(node).children;
    !children.is_empty() && children.iter().all(|c| matches!(c, Some(idx) if pool.get(*idx).solved))
}

/// running-mean backup: each decision-node visit folds its best child's
/// value estimate into `future_reward` with weight `1 / number_of_visits`;
/// chance nodes backup the trial's accumulated reward the same way.
pub struct MonteCarloBackup;

impl Ingredient for MonteCarloBackup {}

impl super::BackupFunction for MonteCarloBackup {
    fn backup_decision_node(&mut self, pool: &mut NodePool, node: NodeIndex, qvalue_mean: &[f64]) {
        let best = applicable_children(pool, node)
            .into_iter()
            .map(|idx| pool.get(idx).expected_reward_estimate(qvalue_mean))
            .fold(f64::NEG_INFINITY, f64::max);
        let n = pool.get(node);
        let solved = applicable_children(pool, node)
            .into_iter()
            .all(|idx| pool.get(idx).solved);
        let visits = n.number_of_visits + 1;
        let previous = if n.future_reward.is_finite() { n.future_reward } else { 0.0 };
        let updated = previous + (best - previous) / visits as f64;
        let node_mut = pool.get_mut(node);
        node_mut.future_reward = updated;
        node_mut.number_of_visits = visits;
        node_mut.solved = solved;
    }

    fn backup_chance_node(&mut self, pool: &mut NodePool, node: NodeIndex, trial_reward: f64) {
        let n = pool.get(node);
        let visits = n.number_of_visits + 1;
        let previous = if n.future_reward.is_finite() { n.future_reward } else { 0.0 };
        let updated = previous + (trial_reward - previous) / visits as f64;
        let solved = chance_node_solved(pool, node);
        let node_mut = pool.get_mut(node);
        node_mut.future_reward = updated;
        node_mut.number_of_visits = visits;
        node_mut.solved = solved;
    }
}

/// partial Bellman backup: decision nodes take the exact max over children
/// rather than a running mean, matching the `-backup PB` variant used with
/// a fully expanded action set.
pub struct PartialBellmanBackup;

impl Ingredient for PartialBellmanBackup {}

impl super::BackupFunction for PartialBellmanBackup {
    fn backup_decision_node(&mut self, pool: &mut NodePool, node: NodeIndex, qvalue_mean: &[f64]) {
        let children = applicable_children(pool, node);
        let best = children
            .iter()
            .map(|idx| pool.get(*idx).expected_reward_estimate(qvalue_mean))
            .fold(f64::NEG_INFINITY, f64::max);
        let solved = children.iter().all(|idx| pool.get(*idx).solved);
        let node_mut = pool.get_mut(node);
        node_mut.future_reward = best;
        node_mut.number_of_visits += 1;
        node_mut.solved = solved;
    }

    fn backup_chance_node(&mut self, pool: &mut NodePool, node: NodeIndex, trial_reward: f64) {
        let n = pool.get(node);
        let visits = n.number_of_visits + 1;
        let previous = if n.future_reward.is_finite() { n.future_reward } else { 0.0 };
        let updated = previous + (trial_reward - previous) / visits as f64;
        let solved = chance_node_solved(pool, node);
        let node_mut = pool.get_mut(node);
        node_mut.future_reward = updated;
        node_mut.number_of_visits = visits;
        node_mut.solved = solved;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thts::ingredients::BackupFunction;

    #[test]
    fn monte_carlo_backup_tracks_running_mean() {
        let mut pool = NodePool::new(10);
        let root = pool.create_root_node(2);
        let chance = pool.create_chance_node(1.0, 1, true);
        pool.get_mut(root).children = vec![Some(chance)];
        let mut backup = MonteCarloBackup;
        backup.backup_chance_node(&mut pool, chance, 4.0);
        backup.backup_chance_node(&mut pool, chance, 6.0);
        assert_eq!(pool.get(chance).future_reward, 5.0);
        assert_eq!(pool.get(chance).number_of_visits, 2);
    }

    #[test]
    fn decision_node_solved_once_every_child_solved() {
        let mut pool = NodePool::new(10);
        let root = pool.create_root_node(2);
        let chance = pool.create_chance_node(1.0, 1, true);
        pool.get_mut(root).children = vec![Some(chance)];
        pool.get_mut(chance).solved = true;
        pool.get_mut(chance).future_reward = 3.0;
        let mut backup = MonteCarloBackup;
        backup.backup_decision_node(&mut pool, root, &[]);
        assert!(pool.get(root).solved);
    }
}
