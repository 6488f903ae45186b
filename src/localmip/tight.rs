//! Tightening moves driven by violated and satisfied rows.

use super::engine::LocalMip;
use super::sampling::{sample_front, SamplingPolicy};
use super::score::{tight_delta, tight_score, BestMove, Score};
use super::state::{Candidate, LocalVar, ScanTable};
use crate::error::MipError;
use crate::model::{VarType, FEASIBILITY_TOL};
use rand::Rng;

/// Bound used when the exact tightening delta leaves the domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoundFallback {
    /// Move toward the bound that lowers the row activity.
    Lower,
    /// Move toward the bound that raises the row activity.
    Raise,
}

/// Which tabu memory filters candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TabuRule {
    /// Direction blocked until `allow_*_step`.
    AllowStep,
    /// Only forbids undoing the previous step's move.
    LastStep,
}

impl TabuRule {
    fn blocks(self, var: &LocalVar, delta: f64, step: u64) -> bool {
        match self {
            TabuRule::AllowStep => var.is_tabu(delta, step),
            TabuRule::LastStep => var.reverses_last_step(delta, step),
        }
    }
}

/// Floor for the threshold-gated moves.
pub(crate) const GATED_FLOOR: Score = Score::new(0, -i64::MAX);

impl<'a, R: Rng, P: SamplingPolicy> LocalMip<'a, R, P> {
    /// Pushes one tightening candidate per admissible term of row `con`.
    pub(crate) fn collect_tight(
        &self,
        con: usize,
        fallback: BoundFallback,
        rule: TabuRule,
        out: &mut Vec<Candidate>,
    ) {
        let model = self.model;
        let row = &self.cons[con];
        for &(var, coeff) in &model.constraints[con].terms {
            let local = &self.vars[var];
            let modeled = &model.vars[var];
            let delta = tight_delta(modeled, local.value, row, coeff).unwrap_or_else(|| {
                if (coeff > 0.0) == (fallback == BoundFallback::Lower) {
                    modeled.lower_bound - local.value
                } else {
                    modeled.upper_bound - local.value
                }
            });
            if rule.blocks(local, delta, self.cur_step) || delta.abs() < FEASIBILITY_TOL {
                continue;
            }
            out.push(Candidate { var, delta });
        }
    }

    /// Scores `candidates`, skipping binaries already marked in `scan`.
    fn best_of(&self, candidates: &[Candidate], scan: &mut ScanTable, floor: Score) -> BestMove {
        let mut best = BestMove::new(floor);
        for &c in candidates {
            if self.model.vars[c.var].var_type == VarType::Binary && !scan.mark(c.var) {
                continue;
            }
            let score = tight_score(self.model, &self.cons, self.found_feasible, c.var, c.delta);
            best.offer(c, score);
        }
        best
    }

    /// Tries to repair sampled violated rows (and, once feasible, to
    /// improve the objective).
    ///
    /// Samples `sample_unsat` violated rows, builds one tightening
    /// candidate per term, caps the list at `bms_unsat_*` and applies the
    /// best move if its score is positive. Otherwise falls back to
    /// [`Self::sat_tight_move`] (only once feasible) and then
    /// [`Self::flip_move`]. Binary variables are scored at most once across
    /// the whole cascade.
    pub fn unsat_tight_move(&mut self) -> Result<bool, MipError> {
        let mut scan = std::mem::take(&mut self.scan);
        let result = self.unsat_tight_cascade(&mut scan);
        scan.clear();
        self.scan = scan;
        result
    }

    fn unsat_tight_cascade(&mut self, scan: &mut ScanTable) -> Result<bool, MipError> {
        let mut candidates = std::mem::take(&mut self.candidates);
        let mut rows = std::mem::take(&mut self.con_buf);
        candidates.clear();
        rows.clear();

        rows.extend_from_slice(self.unsat.as_slice());
        let sample = self.config.sample_unsat;
        sample_front(&mut rows, sample, &mut self.rng);
        for &con in rows.iter().take(sample) {
            self.collect_tight(con, BoundFallback::Lower, TabuRule::AllowStep, &mut candidates);
        }
        if self.found_feasible && self.cons[0].is_unsat() {
            self.collect_tight(0, BoundFallback::Lower, TabuRule::AllowStep, &mut candidates);
        }

        let cap = if self.found_feasible {
            self.config.bms_unsat_feas
        } else {
            self.config.bms_unsat_infeas
        };
        sample_front(&mut candidates, cap, &mut self.rng);
        let size = candidates.len().min(cap);
        let best = self.best_of(&candidates[..size], scan, GATED_FLOOR);

        self.candidates = candidates;
        self.con_buf = rows;

        if let Some(mv) = best.improving() {
            self.stats.unsat_tight += 1;
            self.commit(mv, "unsat")?;
            return Ok(true);
        }
        if self.found_feasible && self.sat_tight_move(scan)? {
            return Ok(true);
        }
        self.flip_move(scan)
    }

    /// Tightens sampled satisfied rows to trade slack for score elsewhere.
    ///
    /// Draws `sample_sat` random ordinary rows (duplicates, violated rows
    /// and rows satisfied by bounds alone are dropped) and pushes each term
    /// toward making its row tight. Applies the best move scoring above
    /// zero, sharing `scan` with the caller.
    pub fn sat_tight_move(&mut self, scan: &mut ScanTable) -> Result<bool, MipError> {
        let n_cons = self.model.num_cons();
        if n_cons <= 1 {
            return Ok(false);
        }

        let mut candidates = std::mem::take(&mut self.candidates);
        let mut rows = std::mem::take(&mut self.con_buf);
        candidates.clear();
        rows.clear();

        for _ in 0..self.config.sample_sat {
            let con = self.rng.random_range(1..n_cons);
            if !self.con_mark[con]
                && self.cons[con].is_sat()
                && !self.model.constraints[con].infer_sat
            {
                self.con_mark[con] = true;
                rows.push(con);
            }
        }
        for &con in &rows {
            self.con_mark[con] = false;
            self.collect_tight(con, BoundFallback::Raise, TabuRule::AllowStep, &mut candidates);
        }

        let cap = self.config.bms_sat;
        sample_front(&mut candidates, cap, &mut self.rng);
        let size = candidates.len().min(cap);
        let best = self.best_of(&candidates[..size], scan, GATED_FLOOR);

        self.candidates = candidates;
        self.con_buf = rows;

        match best.improving() {
            Some(mv) => {
                self.stats.sat_tight += 1;
                self.commit(mv, "sat")?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
