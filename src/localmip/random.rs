//! The always-move fallback.

use super::engine::LocalMip;
use super::sampling::{sample_front, SamplingPolicy};
use super::score::{tight_score, BestMove, Score};
use super::tight::{BoundFallback, TabuRule};
use crate::error::MipError;
use rand::Rng;

/// Low enough that any real candidate beats it.
const RANDOM_FLOOR: Score = Score::new(-100_000_000_000, -i64::MAX);

impl<'a, R: Rng, P: SamplingPolicy> LocalMip<'a, R, P> {
    /// Applies the best tightening move of one random violated row, even
    /// if it worsens the score.
    ///
    /// Candidates come from the terms of a single random violated row
    /// (only the previous step's reversal is tabu) plus, once feasible and
    /// not yet improving, the objective's terms (allow-step tabu). Above
    /// `bms_random` candidates, the sample is uniform before feasibility
    /// and chosen by the sampling policy afterwards.
    ///
    /// Returns `Ok(false)` only when no admissible candidate exists.
    pub fn random_tight_move(&mut self) -> Result<bool, MipError> {
        let mut candidates = std::mem::take(&mut self.candidates);
        candidates.clear();

        if !self.unsat.is_empty() {
            let con = self.unsat.get(self.rng.random_range(0..self.unsat.len()));
            self.collect_tight(con, BoundFallback::Lower, TabuRule::LastStep, &mut candidates);
        }
        if self.found_feasible && self.cons[0].is_unsat() {
            self.collect_tight(0, BoundFallback::Lower, TabuRule::AllowStep, &mut candidates);
        }

        let cap = self.config.bms_random;
        if candidates.len() > cap {
            if self.found_feasible {
                self.policy.select(&mut candidates, cap, &mut self.rng);
            } else {
                sample_front(&mut candidates, cap, &mut self.rng);
            }
        }

        let mut best = BestMove::new(RANDOM_FLOOR);
        for &c in candidates.iter().take(cap) {
            let score = tight_score(self.model, &self.cons, self.found_feasible, c.var, c.delta);
            best.offer(c, score);
        }
        self.candidates = candidates;

        let Some(mv) = best.candidate.filter(|c| c.delta != 0.0) else {
            return Ok(false);
        };
        let obj_before = self.cons[0].lhs;
        self.commit(mv, "random")?;
        self.stats.random += 1;

        if self.found_feasible {
            let obj_after = self.cons[0].lhs;
            let scale = obj_before - self.best_obj + 1.0;
            let reward = (obj_before - obj_after) / scale;
            if scale.abs() > f64::EPSILON && reward.is_finite() {
                self.policy.observe(mv.var, reward);
            } else {
                self.policy.observe(mv.var, 0.0);
            }
        }
        Ok(true)
    }
}
