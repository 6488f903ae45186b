//! Error type shared by the model builder and the search engine.

use std::fmt;

/// Errors surfaced by model construction and local search.
#[derive(Debug, Clone, PartialEq)]
pub enum MipError {
    /// A term references a variable index that does not exist.
    UnknownVariable { row: String, var: usize },
    /// Two variables share the same name.
    DuplicateVariable(String),
    /// A variable's lower bound exceeds its upper bound.
    EmptyDomain { var: String, lower: f64, upper: f64 },
    /// A coefficient or right-hand side is NaN or infinite.
    NonFinite { row: String },
    /// A row without terms whose right-hand side can never be met.
    InfeasibleRow { row: String },
    /// A move would leave the variable's domain. The move is not applied.
    OutOfBounds {
        var: usize,
        value: f64,
        lower: f64,
        upper: f64,
    },
    /// A move would give an integral variable a fractional value.
    NonIntegral { var: usize, value: f64 },
    /// Rejected configuration.
    InvalidConfig(String),
}

impl fmt::Display for MipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MipError::UnknownVariable { row, var } => {
                write!(f, "row {row} references unknown variable {var}")
            }
            MipError::DuplicateVariable(name) => write!(f, "duplicate variable name: {name}"),
            MipError::EmptyDomain { var, lower, upper } => {
                write!(f, "variable {var} has empty domain [{lower}, {upper}]")
            }
            MipError::NonFinite { row } => write!(f, "row {row} has a non-finite number"),
            MipError::InfeasibleRow { row } => write!(f, "empty row {row} is infeasible"),
            MipError::OutOfBounds {
                var,
                value,
                lower,
                upper,
            } => write!(
                f,
                "variable {var} would take value {value} outside [{lower}, {upper}]"
            ),
            MipError::NonIntegral { var, value } => {
                write!(f, "integral variable {var} would take value {value}")
            }
            MipError::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for MipError {}
