//! The external collaborators the THTS engine consumes (spec §6). Parsing a
//! domain description, simplifying conditional probabilities, and
//! determinization all live outside this crate's core; what the engine needs
//! from them is captured here as a single trait plus a couple of small value
//! types.
//!
//! PROST resolves a chance node's probabilistic fluents one at a time,
//! chaining intermediate chance nodes until every fluent is determined
//! (`examples/original_source/src/search/thts.cc::visitChanceNode`). That
//! sequencing is an artifact of RDDL's per-fluent conditional probability
//! encoding, not a requirement of the tree shape spec.md §3 describes (a
//! chance node simply has outcome-indexed children). This trait collapses
//! it to the distribution it ultimately computes: given `(state, action)`,
//! the full probability distribution over complete successor states.

use rand::RngCore;
use std::fmt;
use std::hash::Hash;

/// the concrete action tuple an applied-action index names, used only for
/// printing/reporting (spec §6: "Action states").
#[derive(Debug, Clone)]
pub struct ActionState {
    pub label: String,
}

impl fmt::Display for ActionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// Everything the THTS driver needs from a relational-planning domain and
/// problem instance. An implementor owns the instantiated action/fluent
/// tables; the engine never inspects them beyond this interface.
pub trait Environment {
    type State: Clone + Eq + Hash;

    /// deterministic reward of applying `action` in `state`.
    fn calc_reward(&self, state: &Self::State, action: usize) -> f64;

    /// reward of the best last action when `stepsToGo == 1`.
    fn calc_optimal_final_reward(&self, state: &Self::State) -> f64;

    /// the full distribution over successor states of applying `action` in
    /// `state`: pairs of (successor, probability) summing to 1.
    fn calc_successor_distribution(
        &self,
        state: &Self::State,
        action: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<(Self::State, f64)>;

    /// is `state` a reward lock — every applicable action yields the same
    /// reward forever?
    fn is_a_reward_lock(&self, state: &Self::State) -> bool;

    /// one-step reward of a reward-lock state (any applicable action works).
    fn reward_lock_value(&self, state: &Self::State) -> f64;

    /// indicator sequence over all action slots: is action `i` applicable?
    fn applicable_actions(&self, state: &Self::State) -> Vec<bool>;

    /// indices of actions that are applicable AND not dominated/redundant —
    /// the set consulted by `getUniquePolicy` (spec §4.3).
    fn indices_of_applicable_actions(&self, state: &Self::State) -> Vec<usize>;

    /// the best action index at `stepsToGo == 1`.
    fn optimal_final_action_index(&self, state: &Self::State) -> usize;

    /// printable action tuples, indexed by applied-action slot.
    fn action_states(&self) -> &[ActionState];
}
