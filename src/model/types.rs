//! Read-only model structures consumed by the search engine.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Infinity sentinel used for unbounded variable domains.
pub const INFINITY: f64 = 1e20;

/// Tolerance for constraint satisfaction.
pub const FEASIBILITY_TOL: f64 = 1e-6;

/// Margin by which a new incumbent must beat the previous one.
pub const OPTIMAL_TOL: f64 = 1e-4;

/// Domain kind of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum VarType {
    /// Integer in `{0, 1}`.
    Binary,
    /// Integer in `[lower, upper]`.
    Integer,
    /// Continuous in `[lower, upper]`.
    Real,
    /// Lower and upper bound coincide.
    Fixed,
}

impl VarType {
    /// Whether values of this type must be integral.
    pub fn is_integral(self) -> bool {
        matches!(self, VarType::Binary | VarType::Integer)
    }
}

/// One occurrence of a variable inside a constraint.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Incidence {
    /// Constraint index (0 is the objective).
    pub con: usize,
    /// Coefficient of the variable in that constraint.
    pub coeff: f64,
    /// Position of the term inside the constraint's term list.
    pub pos: usize,
}

/// A decision variable.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModelVar {
    pub name: String,
    pub var_type: VarType,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// Every constraint the variable appears in, objective included.
    pub incidences: Vec<Incidence>,
}

impl ModelVar {
    /// Whether `value` lies inside the variable's domain.
    pub fn in_bound(&self, value: f64) -> bool {
        self.lower_bound <= value && value <= self.upper_bound
    }

    /// Whether the domain is bounded on both sides.
    pub fn is_bounded(&self) -> bool {
        self.lower_bound > -INFINITY && self.upper_bound < INFINITY
    }
}

/// A linear constraint `sum(coeff * x) <= rhs`.
///
/// Index 0 of [`MipModel::constraints`] is the objective, stored in the
/// same shape; its `rhs` is unused by the model.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModelCon {
    pub name: String,
    /// `(variable index, coefficient)` pairs in term order.
    pub terms: Vec<(usize, f64)>,
    pub rhs: f64,
    /// Set when the bounds alone guarantee satisfaction.
    pub infer_sat: bool,
}

impl ModelCon {
    /// Number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the constraint has no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Evaluates `sum(coeff * values[var])`.
    pub fn activity(&self, values: impl Fn(usize) -> f64) -> f64 {
        self.terms
            .iter()
            .map(|&(var, coeff)| coeff * values(var))
            .sum()
    }
}

/// A normalized mixed integer program.
///
/// All constraints are `<=` rows and the objective is minimized. Use
/// [`super::MipModelBuilder`] to construct one.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MipModel {
    pub name: String,
    pub vars: Vec<ModelVar>,
    /// Index 0 is the objective.
    pub constraints: Vec<ModelCon>,
    /// `1.0` for minimization, `-1.0` for maximization.
    pub obj_sign: f64,
    /// Constant added to the internal objective before reporting.
    pub obj_bias: f64,
}

impl MipModel {
    /// Number of variables.
    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    /// Number of rows including the objective.
    pub fn num_cons(&self) -> usize {
        self.constraints.len()
    }

    /// The objective row.
    pub fn objective(&self) -> &ModelCon {
        &self.constraints[0]
    }

    /// Maps an internal (minimized) objective to the user's sense.
    pub fn reported_objective(&self, internal: f64) -> f64 {
        self.obj_sign * (internal + self.obj_bias)
    }

    /// Indices of all binary variables.
    pub fn binary_vars(&self) -> Vec<usize> {
        self.vars
            .iter()
            .enumerate()
            .filter(|(_, v)| v.var_type == VarType::Binary)
            .map(|(i, _)| i)
            .collect()
    }
}
