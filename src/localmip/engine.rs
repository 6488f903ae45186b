//! The Local-MIP search engine: state ownership, move application and the
//! main loop.

use super::config::MipConfig;
use super::sampling::{RewardTrace, SamplingPolicy};
use super::state::{Candidate, LocalCon, LocalVar, ScanTable, UnsatSet};
use crate::error::MipError;
use crate::model::{MipModel, ModelVar, VarType, FEASIBILITY_TOL, INFINITY, OPTIMAL_TOL};
use crate::report::Solution;
use log::{debug, info, trace};
use rand::Rng;
use std::time::{Duration, Instant};

/// Largest magnitude for which a bounded integer domain is sampled on
/// restart.
const RESTART_RANGE_LIMIT: f64 = 1e15;

/// Objective match tolerance used by [`LocalMip::verify_solution`].
const VERIFY_TOL: f64 = 1e-3;

/// How a search run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    /// The best objective met the requested target.
    Optimal,
    /// Timed out with a feasible solution.
    Feasible,
    /// Timed out without ever finding a feasible solution.
    Infeasible,
}

/// Counters of applied moves per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveStats {
    pub lift: u64,
    pub unsat_tight: u64,
    pub sat_tight: u64,
    pub flip: u64,
    pub random: u64,
}

impl MoveStats {
    pub fn total(&self) -> u64 {
        self.lift + self.unsat_tight + self.sat_tight + self.flip + self.random
    }
}

/// Weighted tabu local search over a [`MipModel`].
///
/// The engine exclusively owns all mutable search state. Every change to
/// a variable goes through [`LocalMip::apply_move`], which keeps row
/// activities and the unsatisfied set consistent.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, Instant};
/// use u_localmip::localmip::{LocalMip, MipConfig, SearchStatus};
/// use u_localmip::model::{MipModelBuilder, ObjectiveSense, Sense, VarType};
///
/// let mut b = MipModelBuilder::new("demo");
/// let x = b.add_variable("x", VarType::Integer, 0.0, 10.0);
/// b.add_constraint("lb", vec![(x, 1.0)], Sense::Ge, 5.0);
/// b.set_objective(ObjectiveSense::Minimize, vec![(x, 1.0)], 0.0);
/// let model = b.build().unwrap();
///
/// let config = MipConfig::default().with_cutoff(Duration::from_secs(1));
/// let rng = u_numflow::random::create_rng(7);
/// let mut engine = LocalMip::new(&model, &config, rng).unwrap();
/// let status = engine.local_search(Some(5.0), Instant::now()).unwrap();
/// assert_eq!(status, SearchStatus::Optimal);
/// assert_eq!(engine.objective_value(), Some(5.0));
/// ```
pub struct LocalMip<'a, R: Rng, P: SamplingPolicy = RewardTrace> {
    pub(crate) model: &'a MipModel,
    pub(crate) config: &'a MipConfig,
    pub(crate) rng: R,
    pub(crate) policy: P,

    pub(crate) vars: Vec<LocalVar>,
    pub(crate) cons: Vec<LocalCon>,
    pub(crate) unsat: UnsatSet,
    pub(crate) binary_vars: Vec<usize>,

    // Reusable scratch buffers.
    pub(crate) scan: ScanTable,
    pub(crate) candidates: Vec<Candidate>,
    pub(crate) con_buf: Vec<usize>,
    pub(crate) con_mark: Vec<bool>,

    pub(crate) cur_step: u64,
    pub(crate) last_improve_step: u64,
    pub(crate) found_feasible: bool,
    pub(crate) best_obj: f64,
    pub(crate) restarts: u64,
    pub(crate) pick_count: Vec<u64>,
    pub(crate) stats: MoveStats,
    pub(crate) time_to_best: Option<Duration>,
}

impl<'a, R: Rng> LocalMip<'a, R, RewardTrace> {
    /// Creates an engine with the default reward-biased sampling policy.
    pub fn new(model: &'a MipModel, config: &'a MipConfig, rng: R) -> Result<Self, MipError> {
        Self::with_policy(model, config, rng, RewardTrace::new(model.num_vars()))
    }
}

impl<'a, R: Rng, P: SamplingPolicy> LocalMip<'a, R, P> {
    /// Creates an engine with a custom feasible-phase sampling policy.
    ///
    /// State is allocated and initialized, so moves can be applied
    /// immediately.
    pub fn with_policy(
        model: &'a MipModel,
        config: &'a MipConfig,
        rng: R,
        policy: P,
    ) -> Result<Self, MipError> {
        config.validate().map_err(MipError::InvalidConfig)?;

        let n_vars = model.num_vars();
        let n_cons = model.num_cons();
        let mut cons = vec![LocalCon::default(); n_cons];
        for (local, modeled) in cons.iter_mut().zip(&model.constraints).skip(1) {
            local.rhs = modeled.rhs;
        }

        let mut engine = Self {
            model,
            config,
            rng,
            policy,
            vars: vec![LocalVar::default(); n_vars],
            cons,
            unsat: UnsatSet::with_universe(n_cons),
            binary_vars: model.binary_vars(),
            scan: ScanTable::new(n_vars),
            candidates: Vec::new(),
            con_buf: Vec::new(),
            con_mark: vec![false; n_cons],
            cur_step: 0,
            last_improve_step: 0,
            found_feasible: false,
            best_obj: INFINITY,
            restarts: 0,
            pick_count: vec![0; n_vars],
            stats: MoveStats::default(),
            time_to_best: None,
        };
        engine.init_solution();
        engine.init_state();
        debug!(
            "allocated local search for {} ({} vars, {} rows, {} binary)",
            model.name,
            n_vars,
            n_cons - 1,
            engine.binary_vars.len()
        );
        Ok(engine)
    }

    /// Sets every variable to the value of its domain closest to zero.
    pub fn init_solution(&mut self) {
        for (local, modeled) in self.vars.iter_mut().zip(&self.model.vars) {
            local.value = value_nearest_zero(modeled);
        }
    }

    /// Recomputes all row activities and the unsatisfied set from the
    /// current values. The objective threshold is reset to "no incumbent".
    pub fn init_state(&mut self) {
        self.recompute_rows();
        self.cons[0].rhs = INFINITY;
    }

    fn recompute_rows(&mut self) {
        self.unsat.clear();
        let vars = &self.vars;
        for (idx, (local, modeled)) in self
            .cons
            .iter_mut()
            .zip(&self.model.constraints)
            .enumerate()
        {
            local.lhs = modeled.activity(|v| vars[v].value);
            if idx > 0 && local.is_unsat() {
                self.unsat.insert(idx);
            }
        }
    }

    /// Changes `var` by `delta` and updates every dependent row.
    ///
    /// Incident rows are re-summed from scratch rather than shifted by
    /// `coeff * delta`, so no floating-point drift accumulates. Upward moves
    /// make downward moves tabu for `tabu_base + rand(tabu_variation)`
    /// steps, and vice versa.
    ///
    /// # Errors
    ///
    /// [`MipError::OutOfBounds`] or [`MipError::NonIntegral`] if the new
    /// value violates the variable's domain; nothing is modified then.
    pub fn apply_move(&mut self, var: usize, delta: f64) -> Result<(), MipError> {
        let model = self.model;
        let modeled = &model.vars[var];
        let value = settle_value(var, modeled, self.vars[var].value + delta)?;
        self.vars[var].value = value;

        for inc in &modeled.incidences {
            let vars = &self.vars;
            let lhs = model.constraints[inc.con].activity(|v| vars[v].value);
            let con = &mut self.cons[inc.con];
            if inc.con != 0 {
                let was_sat = con.is_sat();
                let now_sat = lhs < con.rhs + FEASIBILITY_TOL;
                if was_sat && !now_sat {
                    self.unsat.insert(inc.con);
                } else if !was_sat && now_sat {
                    self.unsat.remove(inc.con);
                }
            }
            con.lhs = lhs;
        }

        let step = self.cur_step;
        let tenure = self.config.tabu_base + self.rng.random_range(0..self.config.tabu_variation);
        let local = &mut self.vars[var];
        if delta > 0.0 {
            local.last_inc_step = Some(step);
            local.allow_dec_step = step + tenure;
        } else {
            local.last_dec_step = Some(step);
            local.allow_inc_step = step + tenure;
        }
        Ok(())
    }

    /// Applies a chosen candidate and counts the pick.
    pub(crate) fn commit(&mut self, mv: Candidate, kind: &str) -> Result<(), MipError> {
        trace!(
            "step {}: {} move x{} {:+} (unsat {})",
            self.cur_step,
            kind,
            mv.var,
            mv.delta,
            self.unsat.len()
        );
        self.apply_move(mv.var, mv.delta)?;
        self.pick_count[mv.var] += 1;
        Ok(())
    }

    /// Records the current assignment as the incumbent and tightens the
    /// objective row to `best - OPTIMAL_TOL`.
    pub fn update_best_solution(&mut self, start: Instant) {
        self.last_improve_step = self.cur_step;
        for local in &mut self.vars {
            local.best_value = local.value;
        }
        self.best_obj = self.cons[0].lhs;
        self.cons[0].rhs = self.best_obj - OPTIMAL_TOL;

        let elapsed = start.elapsed();
        self.time_to_best = Some(elapsed);
        if !self.found_feasible {
            info!(
                "first feasible solution at step {} ({:.3}s)",
                self.cur_step,
                elapsed.as_secs_f64()
            );
        }
        self.found_feasible = true;
        info!(
            "objective {:<20} {:.3}s",
            self.model.reported_objective(self.best_obj),
            elapsed.as_secs_f64()
        );
    }

    /// Runs the search until `target` is met or the cutoff elapses.
    ///
    /// `target` is in the model's reported units and sense. `start` is the
    /// instant from which the cutoff is measured. Every call starts from a
    /// fresh assignment with unit weights and no incumbent; only the
    /// sampling policy and the random stream carry over.
    pub fn local_search(
        &mut self,
        target: Option<f64>,
        start: Instant,
    ) -> Result<SearchStatus, MipError> {
        self.reset_search();
        loop {
            if self.unsat.is_empty() {
                let obj = &self.cons[0];
                if !self.found_feasible || obj.lhs < obj.rhs {
                    self.update_best_solution(start);
                }

                let lifted = self.lift_move()?;
                if self.reached(target) {
                    info!("target reached at step {}", self.cur_step);
                    return Ok(SearchStatus::Optimal);
                }
                self.cur_step += 1;
                if self.timed_out(start) {
                    break;
                }
                if lifted {
                    continue;
                }
            }

            if self.timed_out(start) {
                break;
            }
            if let Some(limit) = self.config.restart_step {
                if self.cur_step - self.last_improve_step > limit {
                    self.restart();
                }
            }

            if !self.unsat_tight_move()? {
                if self.rng.random_range(0..10_000u32) > self.config.smooth_probability {
                    self.update_weight();
                } else {
                    self.smooth_weight();
                }
                self.random_tight_move()?;
            }
            self.cur_step += 1;
        }

        debug!(
            "cutoff after {} steps, {} moves, {} restarts",
            self.cur_step,
            self.stats.total(),
            self.restarts
        );
        Ok(if self.found_feasible {
            SearchStatus::Feasible
        } else {
            SearchStatus::Infeasible
        })
    }

    fn reset_search(&mut self) {
        self.cur_step = 0;
        self.last_improve_step = 0;
        self.found_feasible = false;
        self.best_obj = INFINITY;
        self.restarts = 0;
        self.stats = MoveStats::default();
        self.time_to_best = None;
        self.pick_count.fill(0);
        for local in &mut self.vars {
            *local = LocalVar::default();
        }
        for con in &mut self.cons {
            con.weight = 1;
        }
        self.init_solution();
        self.init_state();
    }

    fn timed_out(&self, start: Instant) -> bool {
        start.elapsed() >= self.config.cutoff
    }

    fn reached(&self, target: Option<f64>) -> bool {
        match (target, self.objective_value()) {
            (Some(target), Some(obj)) => self.model.obj_sign * (obj - target) <= 0.0,
            _ => false,
        }
    }

    /// Re-randomizes the assignment while keeping part of the incumbent.
    ///
    /// Binary variables get a random bit, bounded integers a uniform value
    /// in range, everything else its value nearest zero. With a feasible
    /// incumbent, each variable falls back to its best value with
    /// probability 1/2. Weights and tabu timestamps are reset.
    pub fn restart(&mut self) {
        self.last_improve_step = self.cur_step;
        self.restarts += 1;

        let step = self.cur_step;
        for (local, modeled) in self.vars.iter_mut().zip(&self.model.vars) {
            local.value = match modeled.var_type {
                VarType::Binary => f64::from(self.rng.random_range(0..2u8)),
                VarType::Integer
                    if modeled.lower_bound > -RESTART_RANGE_LIMIT
                        && modeled.upper_bound < RESTART_RANGE_LIMIT =>
                {
                    let lo = modeled.lower_bound as i64;
                    let hi = modeled.upper_bound as i64;
                    self.rng.random_range(lo..=hi) as f64
                }
                _ => value_nearest_zero(modeled),
            };
            if self.found_feasible && self.rng.random_bool(0.5) {
                local.value = local.best_value;
            }
            local.reset_tabu(step);
        }

        for con in &mut self.cons {
            con.weight = 1;
        }
        self.recompute_rows();
        debug!(
            "restart #{} at step {} ({} unsat)",
            self.restarts,
            step,
            self.unsat.len()
        );
    }

    /// Independently re-checks the incumbent against the model.
    ///
    /// Verifies bounds, every row with [`FEASIBILITY_TOL`], and that the
    /// recomputed objective matches the recorded one within `1e-3`.
    pub fn verify_solution(&self) -> bool {
        if !self.found_feasible {
            return false;
        }
        for (local, modeled) in self.vars.iter().zip(&self.model.vars) {
            if !modeled.in_bound(local.best_value) {
                debug!("{} = {} out of bounds", modeled.name, local.best_value);
                return false;
            }
        }
        let best = |v: usize| self.vars[v].best_value;
        for con in self.model.constraints.iter().skip(1) {
            let lhs = con.activity(best);
            if lhs > con.rhs + FEASIBILITY_TOL {
                debug!("row {} violated: lhs {} > rhs {}", con.name, lhs, con.rhs);
                return false;
            }
        }
        let obj = self.model.objective().activity(best);
        (obj - self.best_obj).abs() < VERIFY_TOL
    }

    /// Best objective in the model's own sense, if a feasible solution was
    /// found.
    pub fn objective_value(&self) -> Option<f64> {
        self.found_feasible
            .then(|| self.model.reported_objective(self.best_obj))
    }

    /// Snapshot of the incumbent as `name -> value`.
    pub fn best_solution(&self) -> Solution {
        Solution {
            objective: self.objective_value(),
            values: self
                .model
                .vars
                .iter()
                .zip(&self.vars)
                .map(|(m, l)| (m.name.clone(), l.best_value))
                .collect(),
        }
    }

    pub fn is_found_feasible(&self) -> bool {
        self.found_feasible
    }

    pub fn cur_step(&self) -> u64 {
        self.cur_step
    }

    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    pub fn stats(&self) -> MoveStats {
        self.stats
    }

    /// Elapsed time (from the search start) at which the incumbent was
    /// recorded.
    pub fn time_to_best(&self) -> Option<Duration> {
        self.time_to_best
    }

    /// Current value of `var`.
    pub fn value(&self, var: usize) -> f64 {
        self.vars[var].value
    }

    /// Search state of `var`.
    pub fn var_state(&self, var: usize) -> &LocalVar {
        &self.vars[var]
    }

    /// Search state of row `con`; row 0 is the objective.
    pub fn con_state(&self, con: usize) -> &LocalCon {
        &self.cons[con]
    }

    /// Indices of currently violated rows.
    pub fn unsat_rows(&self) -> &[usize] {
        self.unsat.as_slice()
    }

    /// Times each variable was chosen by a move.
    pub fn pick_counts(&self) -> &[u64] {
        &self.pick_count
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }
}

/// Lower bound if positive, upper bound if negative, else zero.
fn value_nearest_zero(var: &ModelVar) -> f64 {
    if var.lower_bound > 0.0 {
        var.lower_bound
    } else if var.upper_bound < 0.0 {
        var.upper_bound
    } else {
        0.0
    }
}

/// Removes rounding noise from `raw` and checks it against the domain.
///
/// Values within `1e-9` (relative) of a bound or of an integer are snapped
/// onto it; anything further off is an error.
fn settle_value(idx: usize, var: &ModelVar, raw: f64) -> Result<f64, MipError> {
    let noise = 1e-9 * raw.abs().max(1.0);
    let mut value = raw;
    if var.var_type.is_integral() {
        let rounded = raw.round();
        if (raw - rounded).abs() > noise {
            return Err(MipError::NonIntegral { var: idx, value: raw });
        }
        value = rounded;
    }
    if value < var.lower_bound && var.lower_bound - value <= noise {
        value = var.lower_bound;
    } else if value > var.upper_bound && value - var.upper_bound <= noise {
        value = var.upper_bound;
    }
    if !var.in_bound(value) {
        return Err(MipError::OutOfBounds {
            var: idx,
            value,
            lower: var.lower_bound,
            upper: var.upper_bound,
        });
    }
    Ok(value)
}
