//! Feasibility-preserving objective moves.

use super::engine::LocalMip;
use super::sampling::SamplingPolicy;
use super::state::Candidate;
use crate::error::MipError;
use crate::model::{FEASIBILITY_TOL, INFINITY};
use rand::Rng;

impl<'a, R: Rng, P: SamplingPolicy> LocalMip<'a, R, P> {
    /// Moves one objective variable as far as feasibility allows.
    ///
    /// For each objective term, the admissible delta interval is the
    /// intersection of the variable's domain with the slack of every
    /// incident row (integral variables round the endpoints inward). The
    /// term moves to the endpoint that decreases the objective, and the
    /// largest decrease wins. Tabu is ignored. Meant to run while every
    /// row is satisfied.
    pub fn lift_move(&mut self) -> Result<bool, MipError> {
        let model = self.model;
        let mut best: Option<Candidate> = None;
        let mut best_gain = 0.0;

        for &(var, obj_coeff) in &model.objective().terms {
            let modeled = &model.vars[var];
            let value = self.vars[var].value;
            let mut lo = modeled.lower_bound - value;
            let mut hi = modeled.upper_bound - value;

            for inc in modeled.incidences.iter().filter(|inc| inc.con != 0) {
                let con = &self.cons[inc.con];
                let slack = (con.rhs - con.lhs).max(0.0);
                if inc.coeff > 0.0 {
                    hi = hi.min(slack / inc.coeff);
                } else {
                    lo = lo.max(slack / inc.coeff);
                }
            }
            if modeled.var_type.is_integral() {
                lo = lo.ceil();
                hi = hi.floor();
            }
            if lo > hi {
                continue;
            }

            let delta = if obj_coeff > 0.0 { lo } else { hi };
            if delta.abs() < FEASIBILITY_TOL || (value + delta).abs() >= INFINITY {
                continue;
            }
            let gain = -obj_coeff * delta;
            if gain > best_gain {
                best_gain = gain;
                best = Some(Candidate { var, delta });
            }
        }

        match best {
            Some(mv) => {
                self.stats.lift += 1;
                self.commit(mv, "lift")?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
