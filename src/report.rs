//! Solution snapshots and result reporting.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Snapshot of the best assignment found by a search.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Solution {
    /// Objective in the model's own sense, `None` if never feasible.
    pub objective: Option<f64>,
    /// `(variable name, value)` in model order.
    pub values: Vec<(String, f64)>,
}

impl Solution {
    /// Value of the variable called `name`.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, v)| v)
    }

    /// Entries whose value is not zero.
    pub fn nonzero(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values
            .iter()
            .filter(|(_, v)| *v != 0.0)
            .map(|(n, v)| (n.as_str(), *v))
    }

    /// Writes the non-zero entries as a two-column table.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{:<50}        {}", "Variable name", "Variable value")?;
        for (name, value) in self.nonzero() {
            writeln!(out, "{:<50}        {}", name, value)?;
        }
        Ok(())
    }
}

/// One line of a results log.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunSummary {
    /// Whether a feasible solution was found.
    pub win: bool,
    /// Seconds until the best solution was recorded (or the whole run).
    pub run_time: f64,
    /// Best objective, if any.
    pub objective: Option<f64>,
}

impl RunSummary {
    /// Formats as `win,run_time,objective` with `N/A` for a missing
    /// objective.
    pub fn to_line(&self) -> String {
        match (self.win, self.objective) {
            (true, Some(obj)) => format!("1,{:.5},{:.5}", self.run_time, obj),
            _ => format!("0,{:.5},N/A", self.run_time),
        }
    }
}

/// Appends `summary` as one line to the file at `path`, creating it if
/// needed.
pub fn append_result(path: impl AsRef<Path>, summary: &RunSummary) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", summary.to_line())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Solution {
        Solution {
            objective: Some(3.0),
            values: vec![
                ("x".to_string(), 1.0),
                ("y".to_string(), 0.0),
                ("z".to_string(), 2.5),
            ],
        }
    }

    #[test]
    fn test_get_and_nonzero() {
        let sol = sample();
        assert_eq!(sol.get("z"), Some(2.5));
        assert_eq!(sol.get("w"), None);
        let names: Vec<&str> = sol.nonzero().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["x", "z"]);
    }

    #[test]
    fn test_write_to_skips_zeros() {
        let mut buf = Vec::new();
        sample().write_to(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Variable name"));
        assert!(lines[1].starts_with('x'));
        assert!(lines[2].trim_end().ends_with("2.5"));
    }

    #[test]
    fn test_summary_lines() {
        let win = RunSummary {
            win: true,
            run_time: 1.5,
            objective: Some(-4.0),
        };
        assert_eq!(win.to_line(), "1,1.50000,-4.00000");

        let lose = RunSummary {
            win: false,
            run_time: 10.0,
            objective: None,
        };
        assert_eq!(lose.to_line(), "0,10.00000,N/A");
    }

    #[test]
    fn test_append_result() {
        let path = std::env::temp_dir().join(format!(
            "u_localmip_report_{}.csv",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let summary = RunSummary {
            win: true,
            run_time: 0.25,
            objective: Some(7.0),
        };
        append_result(&path, &summary).unwrap();
        append_result(&path, &summary).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "1,0.25000,7.00000\n1,0.25000,7.00000\n");
        std::fs::remove_file(&path).unwrap();
    }
}
