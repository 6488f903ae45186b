//! Static MIP model description.
//!
//! A [`MipModel`] is built once (see [`MipModelBuilder`]) and read-only
//! during search. Every constraint is stored as a `<=` row, the objective
//! lives at row index 0 and is always minimized internally.

mod builder;
mod types;

pub use builder::{MipModelBuilder, ObjectiveSense, Sense};
pub use types::{
    Incidence, MipModel, ModelCon, ModelVar, VarType, FEASIBILITY_TOL, INFINITY, OPTIMAL_TOL,
};
