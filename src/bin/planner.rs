//! CLI demo: runs the THTS engine against the toy corridor domain from a
//! given starting position, one decision at a time, until the goal is
//! reached. Mirrors the teacher's CLI entry points
//! (`src/bin/trainer.rs`/`src/bin/analyze.rs`) in using `clap::Parser` for
//! argument handling and `log` for progress reporting.

use clap::Parser;
use log::info;

use thts::init_logging;
use thts::thts::config::Config;
use thts::thts::driver::Engine;
use thts::thts::toy::{CorridorEnvironment, CorridorState};

#[derive(Parser)]
#[command(author, version, about = "trial-based heuristic tree search demo planner")]
struct Cli {
    #[command(flatten)]
    config: Config,

    /// length of the toy corridor domain.
    #[arg(long, default_value_t = 10)]
    corridor_length: usize,

    /// planning horizon per decision.
    #[arg(long, default_value_t = 20)]
    horizon: usize,
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let environment = CorridorEnvironment::new(cli.corridor_length);
    let mut engine = Engine::new(environment, cli.horizon, &cli.config)?;
    engine.learn()?;

    let mut state = CorridorState { position: 0 };
    let mut step = 0;
    loop {
        let report = engine.estimate_best_action(&state)?;
        info!("step {step}: position={} -> {report}", state.position);
        if report.recommended_action == CorridorEnvironment::STAY && state.position >= cli.corridor_length {
            break;
        }
        state = if report.recommended_action == CorridorEnvironment::FORWARD {
            CorridorState { position: (state.position + 1).min(cli.corridor_length) }
        } else {
            state
        };
        step += 1;
        if state.position >= cli.corridor_length || step > cli.corridor_length * 4 {
            break;
        }
    }

    println!("reached position {} in {step} decisions", state.position);
    Ok(())
}
