//! Weighted tabu local search for mixed integer programming.
//!
//! Given linear constraints and a linear objective over binary, integer
//! and real variables, the search first looks for a feasible assignment and
//! then keeps improving the objective with single-variable moves, instead
//! of branch-and-bound.
//!
//! - **Model**: [`model::MipModelBuilder`] normalizes rows to `<=` form,
//!   tightens bounds and builds the variable/row incidence lists.
//! - **Local-MIP**: [`localmip::LocalMip`] owns the mutable search state and
//!   runs the move cascade (lift, unsat-tight, sat-tight, flip, random
//!   tight) under adaptive constraint weights.
//! - **Report**: [`report::Solution`] snapshots and one-line result logs.
//!
//! # Architecture
//!
//! This crate sits at Layer 2 (Algorithms) in the U-Engine ecosystem,
//! depending only on `u-numflow` (Layer 1: Foundation) for its random
//! streams. File formats are left to consumers: models are built in
//! memory.

pub mod error;
pub mod localmip;
pub mod model;
pub mod report;

pub use error::MipError;
