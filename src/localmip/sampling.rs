//! Bounded candidate sampling ("best from multiple selections").
//!
//! Every move scores at most `k` candidates. [`sample_front`] draws them
//! uniformly by a partial Fisher-Yates shuffle; [`select_front_by_key`]
//! instead pulls the `k` highest-keyed candidates forward. Both partition
//! the slice in place so the selected prefix can be scored directly.

use super::state::Candidate;
use rand::Rng;

/// Moves `k` uniformly chosen elements into `items[..k]`.
///
/// No-op when `items.len() <= k`.
pub fn sample_front<T, R: Rng>(items: &mut [T], k: usize, rng: &mut R) {
    let n = items.len();
    if n <= k {
        return;
    }
    for i in 0..k {
        let j = i + rng.random_range(0..n - i);
        items.swap(i, j);
    }
}

/// Moves the `k` elements with the largest `key` into `items[..k]`, in
/// descending order. Ties keep the earlier element.
pub fn select_front_by_key<T>(items: &mut [T], k: usize, key: impl Fn(&T) -> f64) {
    let n = items.len();
    if n <= k {
        return;
    }
    for i in 0..k {
        let mut best = i;
        let mut best_key = f64::NEG_INFINITY;
        for (j, item) in items.iter().enumerate().skip(i) {
            let v = key(item);
            if v > best_key {
                best_key = v;
                best = j;
            }
        }
        items.swap(i, best);
    }
}

/// Chooses which candidates the random tight move scores once a feasible
/// solution exists.
///
/// Implementors only reorder `pool` so the preferred `k` come first, and
/// may learn from the objective change caused by each applied move.
pub trait SamplingPolicy {
    /// Moves the `k` preferred candidates to the front of `pool`.
    fn select<R: Rng>(&mut self, pool: &mut [Candidate], k: usize, rng: &mut R);

    /// Records the normalized objective gain of a move on `var`.
    fn observe(&mut self, _var: usize, _reward: f64) {}
}

/// Uniform sampling, ignoring rewards.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformPolicy;

impl SamplingPolicy for UniformPolicy {
    fn select<R: Rng>(&mut self, pool: &mut [Candidate], k: usize, rng: &mut R) {
        sample_front(pool, k, rng);
    }
}

/// Slots in each variable's reward window.
pub const REWARD_WINDOW: usize = 5;

const DECAY: f64 = 0.89;

/// Recency-weighted reward trace per variable.
///
/// Each variable keeps its last [`REWARD_WINDOW`] rewards in a ring buffer.
/// After every observation its value grows by the decayed sum of the
/// window, and selection greedily prefers high-valued variables.
#[derive(Debug, Clone)]
pub struct RewardTrace {
    rewards: Vec<[f64; REWARD_WINDOW]>,
    cursor: Vec<usize>,
    value: Vec<f64>,
}

impl RewardTrace {
    pub fn new(num_vars: usize) -> Self {
        Self {
            rewards: vec![[0.0; REWARD_WINDOW]; num_vars],
            cursor: vec![0; num_vars],
            value: vec![1.0; num_vars],
        }
    }

    /// Current selection value of `var`.
    pub fn value(&self, var: usize) -> f64 {
        self.value[var]
    }
}

impl SamplingPolicy for RewardTrace {
    fn select<R: Rng>(&mut self, pool: &mut [Candidate], k: usize, _rng: &mut R) {
        let value = &self.value;
        select_front_by_key(pool, k, |c| value[c.var]);
    }

    fn observe(&mut self, var: usize, reward: f64) {
        let cursor = self.cursor[var];
        self.rewards[var][cursor] = reward;

        // Oldest slot gets DECAY^4, the newest DECAY^0.
        let mut gamma = DECAY.powi(REWARD_WINDOW as i32 - 1);
        for offset in 1..=REWARD_WINDOW {
            self.value[var] += gamma * self.rewards[var][(cursor + offset) % REWARD_WINDOW];
            gamma /= DECAY;
        }
        self.cursor[var] = (cursor + 1) % REWARD_WINDOW;
    }
}
