//! `SearchNode` and the index type that replaces pointers into the arena
//! (spec.md §3). Grounded in the shape of PROST's `SearchNode` struct
//! (`examples/original_source/src/search/thts.h`), reworked as a flat,
//! index-addressed value rather than a pointer-linked tree node.

/// An index into a `NodePool`'s backing storage. `None` stands in for the
/// original's null pointer / unused child slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeIndex(pub usize);

/// A single decision or chance node. Both kinds share a representation;
/// `is_chance_node` distinguishes them the way PROST distinguishes
/// `SearchNode` subclasses only by a flag and by which fields are
/// meaningful.
#[derive(Debug, Clone)]
pub struct SearchNode {
    /// probability of reaching this node from its parent (1.0 for decision
    /// nodes reached deterministically, the sampled-outcome probability for
    /// chance-node children).
    pub prob: f64,
    /// reward collected on the edge into this node.
    pub immediate_reward: f64,
    /// current estimate of reward-to-go from this node, before equivalence
    /// aggregation. `f64::NEG_INFINITY` marks "not yet initialized".
    pub future_reward: f64,
    /// remaining decision stages from this node to the horizon.
    pub steps_to_go: usize,
    /// trial visit count, used by UCB1-style action selection.
    pub number_of_visits: u32,
    /// true once an `Initializer` has populated this node's children.
    pub initialized: bool,
    /// true once a child (or this node directly) is known to need no
    /// further trials.
    pub solved: bool,
    /// decision node vs. chance node.
    pub is_chance_node: bool,
    /// for a chance node: true if its children are applied-action decision
    /// children (an "action node"); false if they're further chance nodes
    /// for a still-unresolved probabilistic fluent.
    pub is_action_node: bool,
    /// children, indexed by applied-action index (decision nodes) or
    /// outcome index (chance nodes). `None` marks an unexpanded slot.
    pub children: Vec<Option<NodeIndex>>,
    /// assigned equivalence-class id, set during `generate_equivalence_classes`
    /// and invalidated (`None`) by every rebuild and every node reuse.
    pub equivalence_class: Option<usize>,
}

impl SearchNode {
    pub fn new_decision(prob: f64, immediate_reward: f64, steps_to_go: usize) -> Self {
        Self {
            prob,
            immediate_reward,
            future_reward: f64::NEG_INFINITY,
            steps_to_go,
            number_of_visits: 0,
            initialized: false,
            solved: false,
            is_chance_node: false,
            is_action_node: false,
            children: Vec::new(),
            equivalence_class: None,
        }
    }

    pub fn new_chance(prob: f64, steps_to_go: usize, is_action_node: bool) -> Self {
        Self {
            prob,
            immediate_reward: 0.0,
            future_reward: f64::NEG_INFINITY,
            steps_to_go,
            number_of_visits: 0,
            initialized: false,
            solved: false,
            is_chance_node: true,
            is_action_node,
            children: Vec::new(),
            equivalence_class: None,
        }
    }

    /// reuse this slot for a fresh node, exactly as PROST's `reset()` clears
    /// a pool slot for reuse instead of allocating a new one.
    pub fn reset_as_decision(&mut self, prob: f64, immediate_reward: f64, steps_to_go: usize) {
        self.prob = prob;
        self.immediate_reward = immediate_reward;
        self.future_reward = f64::NEG_INFINITY;
        self.steps_to_go = steps_to_go;
        self.number_of_visits = 0;
        self.initialized = false;
        self.solved = false;
        self.is_chance_node = false;
        self.is_action_node = false;
        self.children.clear();
        self.equivalence_class = None;
    }

    pub fn reset_as_chance(&mut self, prob: f64, steps_to_go: usize, is_action_node: bool) {
        self.prob = prob;
        self.immediate_reward = 0.0;
        self.future_reward = f64::NEG_INFINITY;
        self.steps_to_go = steps_to_go;
        self.number_of_visits = 0;
        self.initialized = false;
        self.solved = false;
        self.is_chance_node = true;
        self.is_action_node = is_action_node;
        self.children.clear();
        self.equivalence_class = None;
    }

    /// a node with no (yet materialized) children — leaf status in the
    /// equivalence-class builder's sense (spec.md §4.4).
    pub fn is_a_leaf(&self) -> bool {
        self.children.iter().all(|c| c.is_none())
    }

    /// accessor described in spec.md §9 Open Question (b): reads
    /// `qvalue_mean[class]` once an equivalence class is assigned, else
    /// falls back to `immediate_reward + future_reward`.
    pub fn expected_reward_estimate(&self, qvalue_mean: &[f64]) -> f64 {
        match self.equivalence_class {
            Some(class) => qvalue_mean[class],
            None => self.immediate_reward + self.future_reward,
        }
    }
}
