//! Move scoring and tightening deltas.

use super::state::{Candidate, LocalCon};
use crate::model::{MipModel, ModelVar, VarType, FEASIBILITY_TOL};

/// Weighted effect of a candidate move.
///
/// Ordered lexicographically: `score` first, `subscore` breaks ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Score {
    /// Net change in weighted satisfaction (and objective progress).
    pub score: i64,
    /// Net change in stability margins, used only to break ties.
    pub subscore: i64,
}

impl Score {
    pub const fn new(score: i64, subscore: i64) -> Self {
        Self { score, subscore }
    }
}

/// Scores changing `var` by `delta` against the current constraint state.
///
/// The objective row (index 0) only contributes once a feasible solution
/// is known: `±weight` by direction, and to the subscore when the move
/// crosses the incumbent threshold `rhs`. Ordinary rows contribute
/// `+weight` when they become satisfied, `-weight` when they break, and
/// `±weight/2` while staying violated, depending on whether the violation
/// shrinks. The subscore tracks entering and leaving the strictly
/// satisfied region `lhs < rhs - tol`.
pub fn tight_score(
    model: &MipModel,
    cons: &[LocalCon],
    feasible: bool,
    var: usize,
    delta: f64,
) -> Score {
    let mut score = 0i64;
    let mut subscore = 0i64;

    for inc in &model.vars[var].incidences {
        let con = &cons[inc.con];
        let new_lhs = con.lhs + inc.coeff * delta;

        if inc.con == 0 {
            if !feasible {
                continue;
            }
            if new_lhs < con.lhs {
                score += con.weight;
            } else {
                score -= con.weight;
            }
            let was_better = con.lhs < con.rhs;
            let now_better = new_lhs < con.rhs;
            if !was_better && now_better {
                subscore += con.weight;
            } else if was_better && !now_better {
                subscore -= con.weight;
            }
            continue;
        }

        let was_sat = con.is_sat();
        let now_sat = new_lhs < con.rhs + FEASIBILITY_TOL;
        match (was_sat, now_sat) {
            (false, true) => score += con.weight,
            (true, false) => score -= con.weight,
            (false, false) => {
                if con.lhs > new_lhs {
                    score += con.weight >> 1;
                } else {
                    score -= con.weight >> 1;
                }
            }
            (true, true) => {}
        }

        let was_stable = con.is_stable();
        let now_stable = new_lhs < con.rhs - FEASIBILITY_TOL;
        if !was_stable && now_stable {
            subscore += con.weight;
        } else if was_stable && !now_stable {
            subscore -= con.weight;
        }
    }

    Score { score, subscore }
}

/// Delta for one term that drives the row's gap `lhs - rhs` to zero.
///
/// Integral variables round toward the satisfied side: `floor` for a
/// positive coefficient, `ceil` for a negative one. Returns `None` when
/// the resulting value leaves the variable's bounds.
pub fn tight_delta(var: &ModelVar, value: f64, con: &LocalCon, coeff: f64) -> Option<f64> {
    let gap = con.lhs - con.rhs;
    let exact = -(gap / coeff);
    let delta = match (var.var_type, coeff > 0.0) {
        (VarType::Real, _) => exact,
        (_, true) => exact.floor(),
        (_, false) => exact.ceil(),
    };
    var.in_bound(value + delta).then_some(delta)
}

/// Running best candidate under lexicographic `(score, subscore)` order.
///
/// A later candidate replaces the incumbent only when strictly better, so
/// the first of several equal candidates wins.
#[derive(Debug, Clone, Copy)]
pub struct BestMove {
    pub score: Score,
    pub candidate: Option<Candidate>,
}

impl BestMove {
    /// Starts with `floor` as the score to beat.
    pub fn new(floor: Score) -> Self {
        Self {
            score: floor,
            candidate: None,
        }
    }

    pub fn offer(&mut self, candidate: Candidate, score: Score) {
        if score > self.score {
            self.score = score;
            self.candidate = Some(candidate);
        }
    }

    /// The best candidate if its primary score is positive.
    pub fn improving(&self) -> Option<Candidate> {
        self.candidate.filter(|_| self.score.score > 0)
    }
}
