//! Local-MIP configuration.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Seed used when [`MipConfig::seed`] is `None`.
pub const DEFAULT_SEED: u64 = 2832;

/// Configuration parameters for the Local-MIP search.
///
/// Sample sizes (`sample_*`) bound how many constraints feed the
/// candidate list of a move; BMS caps (`bms_*`) bound how many candidates
/// are actually scored.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use u_localmip::localmip::MipConfig;
///
/// let config = MipConfig::default()
///     .with_cutoff(Duration::from_secs(30))
///     .with_tabu(3, 10)
///     .with_seed(7);
/// assert_eq!(config.tabu_base, 3);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MipConfig {
    /// Wall-clock budget for one search.
    pub cutoff: Duration,
    /// Unsatisfied constraints sampled by the unsat tight move.
    pub sample_unsat: usize,
    /// Candidate cap of the unsat tight move before feasibility.
    pub bms_unsat_infeas: usize,
    /// Candidate cap of the unsat tight move after feasibility.
    pub bms_unsat_feas: usize,
    /// Random draws used to pick satisfied constraints.
    pub sample_sat: usize,
    /// Candidate cap of the sat tight move.
    pub bms_sat: usize,
    /// Binary variables drawn by the flip move.
    pub bms_flip: usize,
    /// Candidate cap of the random tight move.
    pub bms_random: usize,
    /// Minimum tabu tenure in steps.
    pub tabu_base: u64,
    /// Random extra tenure, drawn from `0..tabu_variation`.
    pub tabu_variation: u64,
    /// Smoothing fires when a draw in `0..10000` is at most this value.
    pub smooth_probability: u32,
    /// Restart after this many steps without improvement. `None` disables.
    pub restart_step: Option<u64>,
    /// Random seed (None for [`DEFAULT_SEED`]).
    pub seed: Option<u64>,
}

impl Default for MipConfig {
    fn default() -> Self {
        Self {
            cutoff: Duration::from_secs(10),
            sample_unsat: 12,
            bms_unsat_infeas: 2000,
            bms_unsat_feas: 3000,
            sample_sat: 20,
            bms_sat: 190,
            bms_flip: 20,
            bms_random: 150,
            tabu_base: 3,
            tabu_variation: 10,
            smooth_probability: 3,
            restart_step: None,
            seed: None,
        }
    }
}

impl MipConfig {
    /// Sets the time limit.
    pub fn with_cutoff(mut self, cutoff: Duration) -> Self {
        self.cutoff = cutoff;
        self
    }

    /// Sets the constraint sample sizes of the unsat and sat tight moves.
    pub fn with_samples(mut self, sample_unsat: usize, sample_sat: usize) -> Self {
        self.sample_unsat = sample_unsat;
        self.sample_sat = sample_sat;
        self
    }

    /// Sets the candidate caps of the unsat tight move.
    pub fn with_bms_unsat(mut self, infeasible: usize, feasible: usize) -> Self {
        self.bms_unsat_infeas = infeasible;
        self.bms_unsat_feas = feasible;
        self
    }

    pub fn with_bms_sat(mut self, n: usize) -> Self {
        self.bms_sat = n;
        self
    }

    pub fn with_bms_flip(mut self, n: usize) -> Self {
        self.bms_flip = n;
        self
    }

    pub fn with_bms_random(mut self, n: usize) -> Self {
        self.bms_random = n;
        self
    }

    /// Sets the tabu tenure `base + rand(0..variation)`.
    pub fn with_tabu(mut self, base: u64, variation: u64) -> Self {
        self.tabu_base = base;
        self.tabu_variation = variation;
        self
    }

    /// Sets the smoothing probability in units of 1/10000.
    pub fn with_smooth_probability(mut self, p: u32) -> Self {
        self.smooth_probability = p;
        self
    }

    /// Enables restarts after `steps` non-improving steps.
    pub fn with_restart_step(mut self, steps: u64) -> Self {
        self.restart_step = Some(steps);
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.cutoff.is_zero() {
            return Err("cutoff must be positive".into());
        }
        if self.sample_unsat == 0 {
            return Err("sample_unsat must be positive".into());
        }
        if self.bms_unsat_infeas == 0 || self.bms_unsat_feas == 0 {
            return Err("bms_unsat caps must be positive".into());
        }
        if self.bms_random == 0 {
            return Err("bms_random must be positive".into());
        }
        if self.tabu_variation == 0 {
            return Err("tabu_variation must be positive".into());
        }
        if self.smooth_probability > 10_000 {
            return Err(format!(
                "smooth_probability must be at most 10000, got {}",
                self.smooth_probability
            ));
        }
        if self.restart_step == Some(0) {
            return Err("restart_step must be positive when set".into());
        }
        Ok(())
    }
}
