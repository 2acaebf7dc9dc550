//! Run reporting: aggregates per-index verdicts into human-readable and
//! machine-readable reports.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::diff::Verdict;

/// Verdict for one pair of files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonOutcome {
    /// Timestep index in range mode.
    pub index: Option<i64>,
    pub file1: PathBuf,
    pub file2: PathBuf,
    pub verdict: Verdict,
}

impl ComparisonOutcome {
    /// Final one-line status, as printed after each comparison.
    pub fn status_line(&self) -> String {
        let state = if self.verdict.is_same() {
            "the same"
        } else {
            "different"
        };
        format!(
            "files {} and {} are {}",
            self.file1.display(),
            self.file2.display(),
            state
        )
    }
}

/// Summary of a comparison run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Number of file pairs the run was configured for.
    pub planned: usize,
    /// Outcomes in execution order. A run stops after the first difference,
    /// so only the last entry can be a mismatch.
    pub outcomes: Vec<ComparisonOutcome>,
}

impl RunReport {
    pub fn new(planned: usize) -> Self {
        Self {
            planned,
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: ComparisonOutcome) {
        self.outcomes.push(outcome);
    }

    /// True if every compared pair was the same.
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.verdict.is_same())
    }

    /// The outcome that stopped the run, if any.
    pub fn failure(&self) -> Option<&ComparisonOutcome> {
        self.outcomes.iter().find(|o| !o.verdict.is_same())
    }

    /// Pairs never compared because the run stopped early.
    pub fn skipped(&self) -> usize {
        self.planned.saturating_sub(self.outcomes.len())
    }

    /// Print a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n============================================================");
        println!(
            "Result: {}",
            if self.passed() { "PASS" } else { "FAIL" }
        );
        println!(
            "Compared: {}/{} pairs, skipped: {}",
            self.outcomes.len(),
            self.planned,
            self.skipped()
        );
        if let Some(failure) = self.failure() {
            match failure.index {
                Some(i) => println!("First difference at index {}", i),
                None => println!("Files differ"),
            }
        }
        println!("============================================================\n");
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }
}
