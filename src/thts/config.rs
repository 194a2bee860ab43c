//! Engine configuration (spec.md §4.6), translating PROST's `-act`/`-out`/
//! `-backup`/`-init`/`-rec`/`-T`/`-r`/`-ndn`/`-node-limit`/`-uf` flags
//! (`examples/original_source/src/search/thts.cc::setValueFromString`) into
//! typed fields. Parsed via `clap::Parser` behind the `cli` feature, the
//! way the teacher's `src/analysis/query.rs` derives its CLI surface;
//! usable without `clap` (and without the `cli` feature) as a plain struct
//! for embedding.

use anyhow::{bail, Result};

#[cfg(feature = "cli")]
use clap::Args;

/// PROST's `TerminationMethod` enum, spelled out as a flag (`-T`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationMethod {
    Time,
    NumberOfTrials,
    TimeAndNumberOfTrials,
}

impl TerminationMethod {
    pub fn parse(token: &str) -> Result<Self> {
        match token {
            "TIME" => Ok(Self::Time),
            "NUMBER_OF_TRIALS" | "TRIALS" => Ok(Self::NumberOfTrials),
            "TIME_AND_NUMBER_OF_TRIALS" | "BOTH" => Ok(Self::TimeAndNumberOfTrials),
            other => bail!("unknown termination method '{other}'"),
        }
    }
}

/// `-ndn`: the number of previously-uninitialized decision nodes a single
/// trial may expand (the "tip" of the trial, spec.md §4.3) before it stops
/// descending and reads back the current node's value instead. PROST
/// accepts the literal token `"H"` to mean "no tighter bound than the
/// problem horizon" instead of a fixed count.
#[derive(Debug, Clone, Copy)]
pub enum NewDecisionNodesPerTrial {
    Horizon,
    Fixed(usize),
}

impl NewDecisionNodesPerTrial {
    pub fn parse(token: &str) -> Result<Self> {
        if token.eq_ignore_ascii_case("H") {
            return Ok(Self::Horizon);
        }
        token
            .parse::<usize>()
            .map(Self::Fixed)
            .map_err(|_| anyhow::anyhow!("invalid -ndn value '{token}', expected an integer or 'H'"))
    }

    pub fn resolve(self, horizon: usize) -> usize {
        match self {
            Self::Horizon => horizon,
            Self::Fixed(n) => n.min(horizon),
        }
    }
}

#[cfg_attr(feature = "cli", derive(Args))]
#[derive(Debug, Clone)]
pub struct Config {
    /// `-act`: action-selection ingredient name (`Uniform`, `RoundRobin`,
    /// `UCB1`).
    #[cfg_attr(feature = "cli", arg(long = "act", default_value = "UCB1"))]
    pub action_selection: String,

    /// `-out`: outcome-selection ingredient name (`MonteCarlo`,
    /// `UnvisitedFirst`).
    #[cfg_attr(feature = "cli", arg(long = "out", default_value = "MonteCarlo"))]
    pub outcome_selection: String,

    /// `-backup`: backup-function ingredient name (`MonteCarlo`,
    /// `PartialBellman`).
    #[cfg_attr(feature = "cli", arg(long = "backup", default_value = "MonteCarlo"))]
    pub backup_function: String,

    /// `-init`: initializer ingredient name (`Uniform`).
    #[cfg_attr(feature = "cli", arg(long = "init", default_value = "Uniform"))]
    pub initializer: String,

    /// per-step reward rate `q0` the `Uniform` initializer scales by the
    /// remaining horizon.
    #[cfg_attr(feature = "cli", arg(long = "q0", default_value_t = 0.0))]
    pub q0: f64,

    /// `-rec`: recommendation-function ingredient name
    /// (`ExpectedBestArm`).
    #[cfg_attr(feature = "cli", arg(long = "rec", default_value = "ExpectedBestArm"))]
    pub recommendation_function: String,

    /// `-T`: termination method token.
    #[cfg_attr(feature = "cli", arg(long = "T", default_value = "TIME"))]
    pub termination: String,

    /// seconds of wall-clock budget per decision, consulted when
    /// `termination` includes TIME. PROST defaults this to 1.0.
    #[cfg_attr(feature = "cli", arg(long = "timeout", default_value_t = 1.0))]
    pub timeout_secs: f64,

    /// trial budget per decision, consulted when `termination` includes
    /// NUMBER_OF_TRIALS.
    #[cfg_attr(feature = "cli", arg(long = "trials", default_value_t = 100_000))]
    pub max_trials: u64,

    /// `-ndn`: new-decision-nodes-per-trial, or the literal token `"H"` for
    /// "bounded only by the horizon".
    #[cfg_attr(feature = "cli", arg(long = "ndn", default_value = "H"))]
    pub new_decision_nodes_per_trial: String,

    /// `-node-limit`: cap on live pool nodes (exclusive of the slack
    /// absorbed between termination checks).
    #[cfg_attr(feature = "cli", arg(long = "node-limit", default_value_t = 24_000_000))]
    pub max_number_of_nodes: usize,

    /// UCB1 samples uniformly at the root instead of by score, to avoid
    /// biasing the final recommendation toward early exploration noise.
    /// spec.md's flag table does not name a flag for this, so it is exposed
    /// under its own long name rather than squatting on `-uf`.
    #[cfg_attr(feature = "cli", arg(long = "uniform-at-root", default_value_t = false))]
    pub uniform_at_root: bool,

    /// `-r`: RNG seed, for reproducible trials.
    #[cfg_attr(feature = "cli", arg(long = "seed", default_value_t = 0))]
    pub random_seed: u64,

    /// `-uf`: equivalence-class rebuild interval, in seconds (spec.md §4.4,
    /// §4.6; PROST's `setValueFromString` reads this as `timestep =
    /// atof(value)`).
    #[cfg_attr(feature = "cli", arg(long = "uf", default_value_t = crate::DEFAULT_REBUILD_INTERVAL))]
    pub rebuild_interval_secs: f64,
}

impl Config {
    pub fn termination_method(&self) -> Result<TerminationMethod> {
        TerminationMethod::parse(&self.termination)
    }

    pub fn new_decision_nodes_per_trial_limit(&self) -> Result<NewDecisionNodesPerTrial> {
        NewDecisionNodesPerTrial::parse(&self.new_decision_nodes_per_trial)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            action_selection: "UCB1".into(),
            outcome_selection: "MonteCarlo".into(),
            backup_function: "MonteCarlo".into(),
            initializer: "Uniform".into(),
            q0: 0.0,
            recommendation_function: "ExpectedBestArm".into(),
            termination: "TIME".into(),
            timeout_secs: 1.0,
            max_trials: 100_000,
            new_decision_nodes_per_trial: "H".into(),
            max_number_of_nodes: 24_000_000,
            uniform_at_root: false,
            random_seed: 0,
            rebuild_interval_secs: crate::DEFAULT_REBUILD_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_termination_token_is_an_error() {
        assert!(TerminationMethod::parse("WHENEVER").is_err());
    }

    #[test]
    fn ndn_accepts_horizon_literal() {
        let limit = NewDecisionNodesPerTrial::parse("H").unwrap();
        assert_eq!(limit.resolve(40), 40);
    }

    #[test]
    fn ndn_fixed_value_caps_at_horizon() {
        let limit = NewDecisionNodesPerTrial::parse("5").unwrap();
        assert_eq!(limit.resolve(40), 5);
        assert_eq!(limit.resolve(3), 3);
    }
}
