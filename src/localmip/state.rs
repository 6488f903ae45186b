//! Mutable per-variable and per-constraint search state.

use crate::model::FEASIBILITY_TOL;

/// Search-time state of one variable.
#[derive(Debug, Clone, Default)]
pub struct LocalVar {
    pub value: f64,
    /// Value in the best feasible solution found so far.
    pub best_value: f64,
    /// Step of the last upward move, if any.
    pub last_inc_step: Option<u64>,
    /// Step of the last downward move, if any.
    pub last_dec_step: Option<u64>,
    /// Upward moves are tabu before this step.
    pub allow_inc_step: u64,
    /// Downward moves are tabu before this step.
    pub allow_dec_step: u64,
}

impl LocalVar {
    /// Whether a move by `delta` is blocked by the allow-step tabu.
    #[inline]
    pub fn is_tabu(&self, delta: f64, step: u64) -> bool {
        (delta < 0.0 && step < self.allow_dec_step) || (delta > 0.0 && step < self.allow_inc_step)
    }

    /// Whether a move by `delta` would undo the move of the previous step.
    #[inline]
    pub fn reverses_last_step(&self, delta: f64, step: u64) -> bool {
        let just = |s: Option<u64>| s.is_some_and(|s| s + 1 == step);
        (delta < 0.0 && just(self.last_inc_step)) || (delta > 0.0 && just(self.last_dec_step))
    }

    pub(crate) fn reset_tabu(&mut self, step: u64) {
        self.last_inc_step = Some(step);
        self.last_dec_step = Some(step);
        self.allow_inc_step = 0;
        self.allow_dec_step = 0;
    }
}

/// Search-time state of one `<=` row.
#[derive(Debug, Clone)]
pub struct LocalCon {
    pub lhs: f64,
    pub rhs: f64,
    /// Penalty multiplier, never negative.
    pub weight: i64,
}

impl Default for LocalCon {
    fn default() -> Self {
        Self {
            lhs: 0.0,
            rhs: 0.0,
            weight: 1,
        }
    }
}

impl LocalCon {
    #[inline]
    pub fn is_sat(&self) -> bool {
        self.lhs < self.rhs + FEASIBILITY_TOL
    }

    #[inline]
    pub fn is_unsat(&self) -> bool {
        !self.is_sat()
    }

    /// Satisfied with a margin of [`FEASIBILITY_TOL`] inside the boundary.
    #[inline]
    pub fn is_stable(&self) -> bool {
        self.lhs < self.rhs - FEASIBILITY_TOL
    }
}

/// Index set with O(1) insert, swap-remove and random access.
///
/// `pos[c]` holds the slot of `c` in `items`, or `usize::MAX` when absent.
#[derive(Debug, Clone, Default)]
pub struct UnsatSet {
    items: Vec<usize>,
    pos: Vec<usize>,
}

impl UnsatSet {
    const ABSENT: usize = usize::MAX;

    /// Creates an empty set over the universe `0..n`.
    pub fn with_universe(n: usize) -> Self {
        Self {
            items: Vec::with_capacity(n),
            pos: vec![Self::ABSENT; n],
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, c: usize) -> bool {
        self.pos[c] != Self::ABSENT
    }

    /// Member at rank `i`.
    pub fn get(&self, i: usize) -> usize {
        self.items[i]
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.items
    }

    pub fn insert(&mut self, c: usize) {
        if self.contains(c) {
            return;
        }
        self.pos[c] = self.items.len();
        self.items.push(c);
    }

    pub fn remove(&mut self, c: usize) {
        let slot = self.pos[c];
        if slot == Self::ABSENT {
            return;
        }
        self.items.swap_remove(slot);
        if let Some(&moved) = self.items.get(slot) {
            self.pos[moved] = slot;
        }
        self.pos[c] = Self::ABSENT;
    }

    pub fn clear(&mut self) {
        for &c in &self.items {
            self.pos[c] = Self::ABSENT;
        }
        self.items.clear();
    }
}

/// Marks binary variables already scored during one step.
///
/// Lent by the search loop to the unsat, sat and flip moves in turn and
/// cleared once the step's cascade is over.
#[derive(Debug, Clone, Default)]
pub struct ScanTable {
    seen: Vec<bool>,
    touched: Vec<usize>,
}

impl ScanTable {
    pub fn new(num_vars: usize) -> Self {
        Self {
            seen: vec![false; num_vars],
            touched: Vec::new(),
        }
    }

    /// Marks `var`; returns `false` if it was already marked.
    pub fn mark(&mut self, var: usize) -> bool {
        if self.seen[var] {
            return false;
        }
        self.seen[var] = true;
        self.touched.push(var);
        true
    }

    pub fn is_marked(&self, var: usize) -> bool {
        self.seen[var]
    }

    pub fn clear(&mut self) {
        for &v in &self.touched {
            self.seen[v] = false;
        }
        self.touched.clear();
    }
}

/// A candidate move: change variable `var` by `delta`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub var: usize,
    pub delta: f64,
}
