//! Binary flip move.

use super::engine::LocalMip;
use super::sampling::SamplingPolicy;
use super::score::{tight_score, BestMove};
use super::state::{Candidate, ScanTable};
use super::tight::GATED_FLOOR;
use crate::error::MipError;
use rand::Rng;

impl<'a, R: Rng, P: SamplingPolicy> LocalMip<'a, R, P> {
    /// Flips the best of up to `bms_flip` randomly drawn binary variables.
    ///
    /// Draws are with replacement; variables already marked in `scan` are
    /// skipped, so at most `bms_flip` distinct flips are scored. Tabu
    /// directions are skipped. Applies the best flip if it scores above
    /// zero.
    pub fn flip_move(&mut self, scan: &mut ScanTable) -> Result<bool, MipError> {
        if self.binary_vars.is_empty() {
            return Ok(false);
        }

        let mut best = BestMove::new(GATED_FLOOR);
        for _ in 0..self.config.bms_flip {
            let var = self.binary_vars[self.rng.random_range(0..self.binary_vars.len())];
            if !scan.mark(var) {
                continue;
            }
            let local = &self.vars[var];
            let delta = if local.value > 0.5 { -1.0 } else { 1.0 };
            if local.is_tabu(delta, self.cur_step) {
                continue;
            }
            let score = tight_score(self.model, &self.cons, self.found_feasible, var, delta);
            best.offer(Candidate { var, delta }, score);
        }

        match best.improving() {
            Some(mv) => {
                self.stats.flip += 1;
                self.commit(mv, "flip")?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
