//! Trial-based heuristic tree search (spec.md §1-§2): an anytime,
//! Monte-Carlo-flavored planner over finite-horizon probabilistic MDPs,
//! grounded in the PROST planner's `THTS` engine
//! (`examples/original_source/src/search/thts.{h,cc}`).
//!
//! Dependency order, matching spec.md §2: node pool → search tree →
//! driver → ingredients → equivalence-class builder → caches.

pub mod cache;
pub mod config;
pub mod driver;
pub mod equivalence;
pub mod external;
pub mod ingredients;
pub mod node;
pub mod pool;
pub mod stopwatch;
pub mod toy;

pub use config::Config;
pub use driver::{Engine, EngineReport, Stats};
pub use external::{ActionState, Environment};
pub use node::{NodeIndex, SearchNode};
pub use pool::NodePool;
