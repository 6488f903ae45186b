//! Programmatic construction of a normalized [`MipModel`].

use super::types::{Incidence, MipModel, ModelCon, ModelVar, VarType, INFINITY};
use crate::error::MipError;
use std::collections::{HashMap, HashSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Relation of a constraint row to its right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Sense {
    /// `lhs <= rhs`
    Le,
    /// `lhs >= rhs`
    Ge,
    /// `lhs == rhs`
    Eq,
}

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ObjectiveSense {
    #[default]
    Minimize,
    Maximize,
}

#[derive(Debug, Clone)]
struct RawVar {
    name: String,
    var_type: VarType,
    lower: f64,
    upper: f64,
}

#[derive(Debug, Clone)]
struct RawRow {
    name: String,
    terms: Vec<(usize, f64)>,
    sense: Sense,
    rhs: f64,
}

/// Builds a [`MipModel`] in `<=` normal form.
///
/// `>=` rows are negated, `=` rows are split into two `<=` rows, duplicate
/// terms are merged, and a maximization objective is negated so the engine
/// always minimizes.
///
/// # Examples
///
/// ```
/// use u_localmip::model::{MipModelBuilder, ObjectiveSense, Sense, VarType};
///
/// let mut b = MipModelBuilder::new("knap");
/// let x = b.add_variable("x", VarType::Binary, 0.0, 1.0);
/// let y = b.add_variable("y", VarType::Binary, 0.0, 1.0);
/// b.add_constraint("cap", vec![(x, 3.0), (y, 4.0)], Sense::Le, 5.0);
/// b.set_objective(ObjectiveSense::Maximize, vec![(x, 2.0), (y, 3.0)], 0.0);
/// let model = b.build().unwrap();
/// assert_eq!(model.num_cons(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MipModelBuilder {
    name: String,
    vars: Vec<RawVar>,
    rows: Vec<RawRow>,
    objective: Vec<(usize, f64)>,
    obj_sense: ObjectiveSense,
    obj_constant: f64,
}

impl MipModelBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Adds a variable and returns its index.
    ///
    /// Infinite bounds are accepted and mapped to [`INFINITY`].
    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        var_type: VarType,
        lower: f64,
        upper: f64,
    ) -> usize {
        self.vars.push(RawVar {
            name: name.into(),
            var_type,
            lower,
            upper,
        });
        self.vars.len() - 1
    }

    /// Adds a constraint row.
    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        terms: Vec<(usize, f64)>,
        sense: Sense,
        rhs: f64,
    ) {
        self.rows.push(RawRow {
            name: name.into(),
            terms,
            sense,
            rhs,
        });
    }

    /// Sets the objective `sum(coeff * x) + constant`.
    pub fn set_objective(
        &mut self,
        sense: ObjectiveSense,
        terms: Vec<(usize, f64)>,
        constant: f64,
    ) {
        self.obj_sense = sense;
        self.objective = terms;
        self.obj_constant = constant;
    }

    /// Validates and normalizes the model.
    pub fn build(self) -> Result<MipModel, MipError> {
        let mut seen = HashSet::with_capacity(self.vars.len());
        let mut vars = Vec::with_capacity(self.vars.len());
        for raw in &self.vars {
            if !seen.insert(raw.name.as_str()) {
                return Err(MipError::DuplicateVariable(raw.name.clone()));
            }
            vars.push(normalize_var(raw)?);
        }

        let (obj_sign, obj_bias) = match self.obj_sense {
            ObjectiveSense::Minimize => (1.0, self.obj_constant),
            ObjectiveSense::Maximize => (-1.0, -self.obj_constant),
        };
        if !self.obj_constant.is_finite() {
            return Err(MipError::NonFinite {
                row: "objective".into(),
            });
        }

        let obj_terms: Vec<(usize, f64)> = self
            .objective
            .iter()
            .map(|&(v, c)| (v, obj_sign * c))
            .collect();
        let mut constraints = vec![ModelCon {
            name: "objective".into(),
            terms: merge_terms("objective", &obj_terms, vars.len())?,
            rhs: INFINITY,
            infer_sat: false,
        }];

        for row in &self.rows {
            if !row.rhs.is_finite() {
                return Err(MipError::NonFinite {
                    row: row.name.clone(),
                });
            }
            let terms = merge_terms(&row.name, &row.terms, vars.len())?;
            let negated: Vec<(usize, f64)> = terms.iter().map(|&(v, c)| (v, -c)).collect();
            match row.sense {
                Sense::Le => constraints.push(make_row(&row.name, terms, row.rhs, &vars)?),
                Sense::Ge => constraints.push(make_row(&row.name, negated, -row.rhs, &vars)?),
                Sense::Eq => {
                    constraints.push(make_row(&format!("{}_le", row.name), terms, row.rhs, &vars)?);
                    constraints.push(make_row(
                        &format!("{}_ge", row.name),
                        negated,
                        -row.rhs,
                        &vars,
                    )?);
                }
            }
        }

        for (con_idx, con) in constraints.iter().enumerate() {
            for (pos, &(var, coeff)) in con.terms.iter().enumerate() {
                vars[var].incidences.push(Incidence {
                    con: con_idx,
                    coeff,
                    pos,
                });
            }
        }

        Ok(MipModel {
            name: self.name,
            vars,
            constraints,
            obj_sign,
            obj_bias,
        })
    }
}

fn normalize_var(raw: &RawVar) -> Result<ModelVar, MipError> {
    let clip = |b: f64| b.clamp(-INFINITY, INFINITY);
    let mut lower = clip(raw.lower);
    let mut upper = clip(raw.upper);
    if raw.lower.is_nan() || raw.upper.is_nan() {
        return Err(MipError::NonFinite {
            row: raw.name.clone(),
        });
    }

    let mut var_type = raw.var_type;
    if var_type == VarType::Binary {
        lower = lower.max(0.0);
        upper = upper.min(1.0);
    }
    if var_type.is_integral() {
        if lower > -INFINITY {
            lower = lower.ceil();
        }
        if upper < INFINITY {
            upper = upper.floor();
        }
    }
    if lower > upper {
        return Err(MipError::EmptyDomain {
            var: raw.name.clone(),
            lower,
            upper,
        });
    }
    if lower == upper {
        var_type = VarType::Fixed;
    } else if var_type == VarType::Integer && lower == 0.0 && upper == 1.0 {
        var_type = VarType::Binary;
    }

    Ok(ModelVar {
        name: raw.name.clone(),
        var_type,
        lower_bound: lower,
        upper_bound: upper,
        incidences: Vec::new(),
    })
}

/// Merges repeated variables and drops zero coefficients, keeping first
/// occurrence order.
fn merge_terms(
    row: &str,
    terms: &[(usize, f64)],
    num_vars: usize,
) -> Result<Vec<(usize, f64)>, MipError> {
    let mut pos_of: HashMap<usize, usize> = HashMap::new();
    let mut merged: Vec<(usize, f64)> = Vec::with_capacity(terms.len());
    for &(var, coeff) in terms {
        if var >= num_vars {
            return Err(MipError::UnknownVariable {
                row: row.to_string(),
                var,
            });
        }
        if !coeff.is_finite() {
            return Err(MipError::NonFinite {
                row: row.to_string(),
            });
        }
        match pos_of.get(&var) {
            Some(&p) => merged[p].1 += coeff,
            None => {
                pos_of.insert(var, merged.len());
                merged.push((var, coeff));
            }
        }
    }
    merged.retain(|&(_, c)| c != 0.0);
    Ok(merged)
}

fn make_row(
    name: &str,
    terms: Vec<(usize, f64)>,
    rhs: f64,
    vars: &[ModelVar],
) -> Result<ModelCon, MipError> {
    if terms.is_empty() && rhs < 0.0 {
        return Err(MipError::InfeasibleRow {
            row: name.to_string(),
        });
    }
    let infer_sat = max_activity(&terms, vars).is_some_and(|max| max <= rhs);
    Ok(ModelCon {
        name: name.to_string(),
        terms,
        rhs,
        infer_sat,
    })
}

/// Largest value the row can take under the variable bounds, or `None`
/// when it is unbounded above.
fn max_activity(terms: &[(usize, f64)], vars: &[ModelVar]) -> Option<f64> {
    let mut total = 0.0;
    for &(var, coeff) in terms {
        let bound = if coeff > 0.0 {
            vars[var].upper_bound
        } else {
            vars[var].lower_bound
        };
        if bound.abs() >= INFINITY {
            return None;
        }
        total += coeff * bound;
    }
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ge_row_is_negated() {
        let mut b = MipModelBuilder::new("t");
        let x = b.add_variable("x", VarType::Integer, 0.0, 10.0);
        b.add_constraint("c", vec![(x, 1.0)], Sense::Ge, 5.0);
        let m = b.build().unwrap();
        assert_eq!(m.constraints[1].terms, vec![(x, -1.0)]);
        assert_eq!(m.constraints[1].rhs, -5.0);
    }

    #[test]
    fn test_eq_row_splits() {
        let mut b = MipModelBuilder::new("t");
        let x = b.add_variable("x", VarType::Real, 0.0, 10.0);
        b.add_constraint("c", vec![(x, 2.0)], Sense::Eq, 4.0);
        let m = b.build().unwrap();
        assert_eq!(m.num_cons(), 3);
        assert_eq!(m.constraints[1].rhs, 4.0);
        assert_eq!(m.constraints[2].rhs, -4.0);
        assert_eq!(m.vars[x].incidences.len(), 2);
    }

    #[test]
    fn test_duplicate_terms_merged() {
        let mut b = MipModelBuilder::new("t");
        let x = b.add_variable("x", VarType::Real, 0.0, 10.0);
        let y = b.add_variable("y", VarType::Real, 0.0, 10.0);
        b.add_constraint("c", vec![(x, 1.0), (y, 1.0), (x, 2.0), (y, -1.0)], Sense::Le, 4.0);
        let m = b.build().unwrap();
        assert_eq!(m.constraints[1].terms, vec![(x, 3.0)]);
    }

    #[test]
    fn test_integer_01_becomes_binary() {
        let mut b = MipModelBuilder::new("t");
        b.add_variable("x", VarType::Integer, -0.5, 1.7);
        b.add_variable("f", VarType::Integer, 2.2, 2.9);
        let m = b.build();
        // ceil(2.2) = 3 > floor(2.9) = 2
        assert!(matches!(m, Err(MipError::EmptyDomain { .. })));

        let mut b = MipModelBuilder::new("t");
        b.add_variable("x", VarType::Integer, -0.5, 1.7);
        b.add_variable("f", VarType::Real, 2.0, 2.0);
        let m = b.build().unwrap();
        assert_eq!(m.vars[0].var_type, VarType::Binary);
        assert_eq!(m.vars[1].var_type, VarType::Fixed);
    }

    #[test]
    fn test_infer_sat_from_bounds() {
        let mut b = MipModelBuilder::new("t");
        let x = b.add_variable("x", VarType::Binary, 0.0, 1.0);
        let y = b.add_variable("y", VarType::Real, 0.0, f64::INFINITY);
        b.add_constraint("loose", vec![(x, 1.0)], Sense::Le, 2.0);
        b.add_constraint("tight", vec![(x, 1.0)], Sense::Le, 0.5);
        b.add_constraint("open", vec![(y, 1.0)], Sense::Le, 2.0);
        let m = b.build().unwrap();
        assert!(m.constraints[1].infer_sat);
        assert!(!m.constraints[2].infer_sat);
        assert!(!m.constraints[3].infer_sat);
        assert_eq!(m.vars[y].upper_bound, INFINITY);
    }

    #[test]
    fn test_maximize_negates_objective() {
        let mut b = MipModelBuilder::new("t");
        let x = b.add_variable("x", VarType::Integer, 0.0, 5.0);
        b.set_objective(ObjectiveSense::Maximize, vec![(x, 2.0)], 1.0);
        let m = b.build().unwrap();
        assert_eq!(m.objective().terms, vec![(x, -2.0)]);
        // x = 3: internal -6, reported 2*3 + 1
        assert!((m.reported_objective(-6.0) - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_variable_rejected() {
        let mut b = MipModelBuilder::new("t");
        b.add_variable("x", VarType::Binary, 0.0, 1.0);
        b.add_constraint("c", vec![(3, 1.0)], Sense::Le, 1.0);
        assert_eq!(
            b.build().unwrap_err(),
            MipError::UnknownVariable {
                row: "c".into(),
                var: 3
            }
        );
    }

    #[test]
    fn test_duplicate_name_and_empty_row() {
        let mut b = MipModelBuilder::new("t");
        b.add_variable("x", VarType::Binary, 0.0, 1.0);
        b.add_variable("x", VarType::Binary, 0.0, 1.0);
        assert!(matches!(b.build(), Err(MipError::DuplicateVariable(_))));

        let mut b = MipModelBuilder::new("t");
        b.add_constraint("never", vec![], Sense::Le, -1.0);
        assert!(matches!(b.build(), Err(MipError::InfeasibleRow { .. })));
    }
}
