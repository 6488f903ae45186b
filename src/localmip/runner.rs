//! One-call Local-MIP execution.

use std::time::{Duration, Instant};

use log::info;

use super::config::{MipConfig, DEFAULT_SEED};
use super::engine::{LocalMip, MoveStats, SearchStatus};
use crate::error::MipError;
use crate::model::MipModel;
use crate::report::{RunSummary, Solution};

/// Result of a Local-MIP run.
#[derive(Debug, Clone)]
pub struct MipResult {
    /// How the search ended.
    pub status: SearchStatus,
    /// Best objective in the model's sense, if a feasible solution was found.
    pub objective: Option<f64>,
    /// Best assignment (all zeros if never feasible).
    pub solution: Solution,
    /// Whether the incumbent passed an independent feasibility re-check.
    pub verified: bool,
    /// Steps executed.
    pub steps: u64,
    /// Restarts performed.
    pub restarts: u64,
    /// Applied moves per kind.
    pub stats: MoveStats,
    /// Total wall-clock time.
    pub elapsed: Duration,
    /// Time at which the incumbent was recorded.
    pub time_to_best: Option<Duration>,
}

impl MipResult {
    /// Whether any feasible solution was found.
    pub fn is_feasible(&self) -> bool {
        self.objective.is_some()
    }

    /// The results-log line for this run. Only a verified incumbent counts
    /// as a win.
    pub fn summary(&self) -> RunSummary {
        let run_time = self.time_to_best.unwrap_or(self.elapsed);
        RunSummary {
            win: self.is_feasible() && self.verified,
            run_time: run_time.as_secs_f64(),
            objective: self.objective,
        }
    }
}

/// Local-MIP runner.
pub struct MipRunner;

impl MipRunner {
    /// Searches `model` until the cutoff.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use u_localmip::localmip::{MipConfig, MipRunner};
    /// use u_localmip::model::{MipModelBuilder, ObjectiveSense, Sense, VarType};
    ///
    /// let mut b = MipModelBuilder::new("pick-one");
    /// let x = b.add_variable("x", VarType::Binary, 0.0, 1.0);
    /// let y = b.add_variable("y", VarType::Binary, 0.0, 1.0);
    /// b.add_constraint("cover", vec![(x, 1.0), (y, 1.0)], Sense::Ge, 1.0);
    /// b.set_objective(ObjectiveSense::Minimize, vec![(x, 2.0), (y, 3.0)], 0.0);
    /// let model = b.build().unwrap();
    ///
    /// let config = MipConfig::default()
    ///     .with_cutoff(Duration::from_millis(100))
    ///     .with_seed(1);
    /// let result = MipRunner::run(&model, &config).unwrap();
    /// assert_eq!(result.objective, Some(2.0));
    /// assert!(result.verified);
    /// ```
    pub fn run(model: &MipModel, config: &MipConfig) -> Result<MipResult, MipError> {
        Self::run_with_target(model, config, None)
    }

    /// Searches `model` until the reported objective meets `target` or the
    /// cutoff elapses.
    pub fn run_with_target(
        model: &MipModel,
        config: &MipConfig,
        target: Option<f64>,
    ) -> Result<MipResult, MipError> {
        let rng = u_numflow::random::create_rng(config.seed.unwrap_or(DEFAULT_SEED));
        let start = Instant::now();

        let mut engine = LocalMip::new(model, config, rng)?;
        let status = engine.local_search(target, start)?;
        let elapsed = start.elapsed();

        let verified = engine.verify_solution();
        let objective = engine.objective_value();
        match objective {
            Some(obj) => info!(
                "{}: {:?}, objective {} after {} steps ({:.3}s)",
                model.name,
                status,
                obj,
                engine.cur_step(),
                elapsed.as_secs_f64()
            ),
            None => info!(
                "{}: no feasible solution after {} steps ({:.3}s)",
                model.name,
                engine.cur_step(),
                elapsed.as_secs_f64()
            ),
        }

        Ok(MipResult {
            status,
            objective,
            solution: engine.best_solution(),
            verified,
            steps: engine.cur_step(),
            restarts: engine.restarts(),
            stats: engine.stats(),
            elapsed,
            time_to_best: engine.time_to_best(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MipModelBuilder, ObjectiveSense, Sense, VarType};

    fn quick() -> MipConfig {
        MipConfig::default()
            .with_cutoff(Duration::from_millis(200))
            .with_seed(42)
    }

    #[test]
    fn test_run_knapsack_maximize() {
        // max 5a + 4b + 3c  s.t. 2a + 3b + c <= 5; optimum a = b = 1 with value 9
        let mut b = MipModelBuilder::new("knapsack");
        let a = b.add_variable("a", VarType::Binary, 0.0, 1.0);
        let bb = b.add_variable("b", VarType::Binary, 0.0, 1.0);
        let c = b.add_variable("c", VarType::Binary, 0.0, 1.0);
        b.add_constraint(
            "cap",
            vec![(a, 2.0), (bb, 3.0), (c, 1.0)],
            Sense::Le,
            5.0,
        );
        b.set_objective(
            ObjectiveSense::Maximize,
            vec![(a, 5.0), (bb, 4.0), (c, 3.0)],
            0.0,
        );
        let model = b.build().unwrap();

        let result = MipRunner::run_with_target(&model, &quick(), Some(9.0)).unwrap();
        assert_eq!(result.status, SearchStatus::Optimal);
        assert_eq!(result.objective, Some(9.0));
        assert!(result.verified);
        assert!(result.summary().win);
    }

    #[test]
    fn test_run_infeasible_model() {
        // x + y >= 3 with two binaries can never hold.
        let mut b = MipModelBuilder::new("hopeless");
        let x = b.add_variable("x", VarType::Binary, 0.0, 1.0);
        let y = b.add_variable("y", VarType::Binary, 0.0, 1.0);
        b.add_constraint("need", vec![(x, 1.0), (y, 1.0)], Sense::Ge, 3.0);
        let model = b.build().unwrap();

        let config = quick().with_cutoff(Duration::from_millis(50));
        let result = MipRunner::run(&model, &config).unwrap();
        assert_eq!(result.status, SearchStatus::Infeasible);
        assert_eq!(result.objective, None);
        assert!(!result.verified);
        assert!(result.steps > 0);

        let summary = result.summary();
        assert!(!summary.win);
        assert!(summary.to_line().ends_with("N/A"));
    }

    #[test]
    fn test_run_rejects_bad_config() {
        let mut b = MipModelBuilder::new("tiny");
        b.add_variable("x", VarType::Binary, 0.0, 1.0);
        let model = b.build().unwrap();

        let config = quick().with_bms_random(0);
        assert!(matches!(
            MipRunner::run(&model, &config),
            Err(MipError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_unverified_result_is_not_a_win() {
        let result = MipResult {
            status: SearchStatus::Feasible,
            objective: Some(3.0),
            solution: Solution {
                objective: Some(3.0),
                values: vec![("x".to_string(), 1.0)],
            },
            verified: false,
            steps: 10,
            restarts: 0,
            stats: MoveStats::default(),
            elapsed: Duration::from_millis(5),
            time_to_best: Some(Duration::from_millis(2)),
        };
        let summary = result.summary();
        assert!(!summary.win);
        assert!(summary.to_line().starts_with("0,"));

        let verified = MipResult {
            verified: true,
            ..result
        };
        assert!(verified.summary().win);
    }

    #[test]
    fn test_run_with_offset_objective() {
        // min x + 10 with x integer in [2, 8]
        let mut b = MipModelBuilder::new("offset");
        let x = b.add_variable("x", VarType::Integer, 2.0, 8.0);
        b.set_objective(ObjectiveSense::Minimize, vec![(x, 1.0)], 10.0);
        let model = b.build().unwrap();

        let result = MipRunner::run_with_target(&model, &quick(), Some(12.0)).unwrap();
        assert_eq!(result.status, SearchStatus::Optimal);
        assert_eq!(result.objective, Some(12.0));
        assert_eq!(result.solution.get("x"), Some(2.0));
    }
}
