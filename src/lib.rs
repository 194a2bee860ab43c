pub mod thts;

/// dimensional analysis types
pub type Reward = f64;
pub type Probability = f64;

/// node pool slack absorbed between termination checks (spec.md 4.1)
pub const NODE_POOL_SLACK: usize = 20_000;

/// default equivalence-class rebuild interval, in seconds
pub const DEFAULT_REBUILD_INTERVAL: f64 = 0.01;

/// UCB1 falls back to this constant exploration weight when a node's
/// immediate future reward estimate is exactly zero.
pub const UCB1_DEFAULT_EXPLORATION_WEIGHT: f64 = 100.0;

/// initialize logging for the `planner` binary. Mirrors the teacher's
/// `init()` helper: a colored terminal logger at info level, built from
/// `simplelog`.
#[cfg(feature = "cli")]
pub fn init_logging() {
    use simplelog::{ColorChoice, CombinedLogger, Config, LevelFilter, TermLogger, TerminalMode};
    let _ = CombinedLogger::init(vec![TermLogger::new(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
