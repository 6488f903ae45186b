//! Local-MIP: weighted tabu local search for mixed integer programs.
//!
//! A single assignment of values is repaired and improved one variable at
//! a time. Each step applies one move chosen from a cascade:
//!
//! 1. a *lift* move while the assignment is feasible,
//! 2. an *unsat-tight* move that pushes a variable of a violated row to
//!    the value that just satisfies it,
//! 3. a *sat-tight* move on satisfied rows (once feasible),
//! 4. a binary *flip*,
//! 5. after a weight update, a *random tight* move that is always applied.
//!
//! Moves are ranked by a weighted score with a stability subscore as
//! tie-breaker. Row weights grow on violated rows and are occasionally
//! smoothed back, and the objective behaves as a weighted row whose
//! threshold tightens with each new incumbent.
//!
//! # References
//!
//! - Lin, P., Zou, M., Cai, S. (2024). "An Efficient Local Search Solver
//!   for Mixed Integer Programming", *CP 2024*.

mod config;
mod engine;
mod flip;
mod lift;
mod random;
mod runner;
mod sampling;
mod score;
mod state;
mod tight;
mod weight;

pub use config::{MipConfig, DEFAULT_SEED};
pub use engine::{LocalMip, MoveStats, SearchStatus};
pub use runner::{MipResult, MipRunner};
pub use sampling::{
    sample_front, select_front_by_key, RewardTrace, SamplingPolicy, UniformPolicy, REWARD_WINDOW,
};
pub use score::{tight_delta, tight_score, BestMove, Score};
pub use state::{Candidate, LocalCon, LocalVar, ScanTable, UnsatSet};
