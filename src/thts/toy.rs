//! A minimal concrete `Environment` for tests and the `planner` CLI demo,
//! analogous to the teacher's `mccfr::rps` submodule: a small, fully
//! concrete instantiation of the trait contract used nowhere in production
//! but everywhere in tests.
//!
//! "Corridor": an agent stands at an integer position in `0..=length`.
//! `FORWARD` advances one cell with probability 0.9 (and slips in place
//! with probability 0.1); `STAY` never moves. Reaching `length` is an
//! absorbing reward lock. `FORWARD` earns a reward of 1 per step taken
//! before the goal; `STAY` earns nothing.

use rand::RngCore;

use super::external::{ActionState, Environment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorridorState {
    pub position: usize,
}

pub struct CorridorEnvironment {
    pub length: usize,
    action_states: Vec<ActionState>,
}

impl CorridorEnvironment {
    pub const FORWARD: usize = 0;
    pub const STAY: usize = 1;

    pub fn new(length: usize) -> Self {
        Self {
            length,
            action_states: vec![
                ActionState { label: "forward".into() },
                ActionState { label: "stay".into() },
            ],
        }
    }

    fn at_goal(&self, state: &CorridorState) -> bool {
        state.position >= self.length
    }
}

impl Environment for CorridorEnvironment {
    type State = CorridorState;

    fn calc_reward(&self, state: &Self::State, action: usize) -> f64 {
        if action == Self::FORWARD && !self.at_goal(state) {
            1.0
        } else {
            0.0
        }
    }

    fn calc_optimal_final_reward(&self, state: &Self::State) -> f64 {
        if self.at_goal(state) {
            0.0
        } else {
            1.0
        }
    }

    fn calc_successor_distribution(
        &self,
        state: &Self::State,
        action: usize,
        _rng: &mut dyn RngCore,
    ) -> Vec<(Self::State, f64)> {
        if self.at_goal(state) {
            return vec![(*state, 1.0)];
        }
        if action == Self::FORWARD {
            vec![
                (CorridorState { position: state.position + 1 }, 0.9),
                (*state, 0.1),
            ]
        } else {
            vec![(*state, 1.0)]
        }
    }

    fn is_a_reward_lock(&self, state: &Self::State) -> bool {
        self.at_goal(state)
    }

    fn reward_lock_value(&self, _state: &Self::State) -> f64 {
        0.0
    }

    fn applicable_actions(&self, _state: &Self::State) -> Vec<bool> {
        vec![true, true]
    }

    fn indices_of_applicable_actions(&self, state: &Self::State) -> Vec<usize> {
        if self.at_goal(state) {
            vec![Self::STAY]
        } else {
            vec![Self::FORWARD, Self::STAY]
        }
    }

    fn optimal_final_action_index(&self, state: &Self::State) -> usize {
        if self.at_goal(state) {
            Self::STAY
        } else {
            Self::FORWARD
        }
    }

    fn action_states(&self) -> &[ActionState] {
        &self.action_states
    }
}

/// A two-decision-stage, two-armed bandit: one deterministic choice between
/// a reward-10 arm and a reward-1 arm, then an absorbing reward lock.
/// Exists purely to exercise `spec.md` §8's UCB1 end-to-end scenario, where
/// the corridor domain's stochastic transitions would add noise the
/// scenario doesn't call for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BanditState {
    pub pulled: Option<usize>,
}

pub struct BanditEnvironment {
    action_states: Vec<ActionState>,
}

impl BanditEnvironment {
    pub const HIGH: usize = 0;
    pub const LOW: usize = 1;

    pub fn new() -> Self {
        Self {
            action_states: vec![
                ActionState { label: "high".into() },
                ActionState { label: "low".into() },
            ],
        }
    }
}

impl Default for BanditEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for BanditEnvironment {
    type State = BanditState;

    fn calc_reward(&self, state: &Self::State, action: usize) -> f64 {
        if state.pulled.is_some() {
            return 0.0;
        }
        if action == Self::HIGH {
            10.0
        } else {
            1.0
        }
    }

    fn calc_optimal_final_reward(&self, _state: &Self::State) -> f64 {
        0.0
    }

    fn calc_successor_distribution(
        &self,
        state: &Self::State,
        action: usize,
        _rng: &mut dyn RngCore,
    ) -> Vec<(Self::State, f64)> {
        if state.pulled.is_some() {
            vec![(*state, 1.0)]
        } else {
            vec![(BanditState { pulled: Some(action) }, 1.0)]
        }
    }

    fn is_a_reward_lock(&self, state: &Self::State) -> bool {
        state.pulled.is_some()
    }

    fn reward_lock_value(&self, _state: &Self::State) -> f64 {
        0.0
    }

    fn applicable_actions(&self, _state: &Self::State) -> Vec<bool> {
        vec![true, true]
    }

    fn indices_of_applicable_actions(&self, state: &Self::State) -> Vec<usize> {
        if state.pulled.is_some() {
            vec![Self::HIGH]
        } else {
            vec![Self::HIGH, Self::LOW]
        }
    }

    fn optimal_final_action_index(&self, _state: &Self::State) -> usize {
        Self::HIGH
    }

    fn action_states(&self) -> &[ActionState] {
        &self.action_states
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_is_a_reward_lock_with_no_further_reward() {
        let env = CorridorEnvironment::new(3);
        let goal = CorridorState { position: 3 };
        assert!(env.is_a_reward_lock(&goal));
        assert_eq!(env.reward_lock_value(&goal), 0.0);
        assert_eq!(env.indices_of_applicable_actions(&goal), vec![CorridorEnvironment::STAY]);
    }

    #[test]
    fn forward_action_earns_reward_before_the_goal() {
        let env = CorridorEnvironment::new(3);
        let mid = CorridorState { position: 1 };
        assert_eq!(env.calc_reward(&mid, CorridorEnvironment::FORWARD), 1.0);
        assert_eq!(env.calc_reward(&mid, CorridorEnvironment::STAY), 0.0);
    }

    #[test]
    fn successor_distribution_sums_to_one() {
        use rand::SeedableRng;
        let env = CorridorEnvironment::new(3);
        let mid = CorridorState { position: 1 };
        let mut rng = rand::rngs::SmallRng::seed_from_u64(42);
        let dist = env.calc_successor_distribution(&mid, CorridorEnvironment::FORWARD, &mut rng);
        let total: f64 = dist.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }
}
