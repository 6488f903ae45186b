//! Constraint weighting.

use super::engine::LocalMip;
use super::sampling::SamplingPolicy;
use rand::Rng;

impl<'a, R: Rng, P: SamplingPolicy> LocalMip<'a, R, P> {
    /// Raises the weight of every violated row by one. When everything is
    /// satisfied after a feasible solution was found, raises the
    /// objective's weight instead.
    pub fn update_weight(&mut self) {
        for &con in self.unsat.as_slice() {
            self.cons[con].weight += 1;
        }
        if self.found_feasible && self.unsat.is_empty() {
            self.cons[0].weight += 1;
        }
    }

    /// Lowers by one the weight of every satisfied row (objective
    /// included) whose weight is still positive.
    pub fn smooth_weight(&mut self) {
        for con in &mut self.cons {
            if con.is_sat() && con.weight > 0 {
                con.weight -= 1;
            }
        }
    }
}
