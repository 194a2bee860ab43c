//! Pluggable strategy contracts (spec.md §4.2), one trait per ingredient
//! slot. All five share the lifecycle hooks PROST's `SearchEngine`-derived
//! ingredients expose (`initRound`/`initStep`/`initTrial`/`disableCaching`/
//! `learn`, see `examples/original_source/src/search/thts.cc`'s
//! `initRound`/`initStep`/`initTrial`/`disableCaching`/`learn` methods,
//! each of which simply forwards to every ingredient in turn).

pub mod action_selection;
pub mod backup;
pub mod initializer;
pub mod outcome_selection;
pub mod recommendation;

use rand::RngCore;

use super::node::NodeIndex;
use super::pool::NodePool;

/// lifecycle hooks common to every ingredient. Defaults are no-ops; an
/// ingredient overrides only the ones it cares about, the same way most of
/// PROST's concrete ingredient subclasses leave most of these empty.
pub trait Ingredient {
    fn init_round(&mut self) {}
    fn init_step(&mut self) {}
    fn init_trial(&mut self) {}
    fn disable_caching(&mut self) {}
    fn learn(&mut self) {}
}

/// selects which applicable-action child of a decision node to descend into
/// (spec.md §4.2).
pub trait ActionSelection: Ingredient {
    fn select_action(
        &mut self,
        pool: &NodePool,
        node: NodeIndex,
        qvalue_mean: &[f64],
        rng: &mut dyn RngCore,
    ) -> usize;
}

/// samples (or creates, on first visit) a decision-node child of a chance
/// node, given the probability of each outcome index in the chance node's
/// successor-state distribution (spec.md §3/§4.2).
pub trait OutcomeSelection: Ingredient {
    fn select_outcome(
        &mut self,
        pool: &mut NodePool,
        chance_node: NodeIndex,
        probs: &[f64],
        rng: &mut dyn RngCore,
    ) -> usize;
}

/// propagates trial results back up the tree after a visit completes.
pub trait BackupFunction: Ingredient {
    fn backup_decision_node(&mut self, pool: &mut NodePool, node: NodeIndex, qvalue_mean: &[f64]);
    fn backup_chance_node(&mut self, pool: &mut NodePool, node: NodeIndex, trial_reward: f64);
}

/// seeds a freshly expanded decision node's children with a prior estimate.
pub trait Initializer: Ingredient {
    fn initialize(
        &mut self,
        pool: &mut NodePool,
        node: NodeIndex,
        applicable: &[bool],
        horizon_factor: f64,
    );
}

/// picks the action the engine ultimately recommends for the root.
pub trait RecommendationFunction: Ingredient {
    fn recommend(&mut self, pool: &NodePool, root: NodeIndex, qvalue_mean: &[f64]) -> usize;
}
