//! Suite analytics for reporting.
//!
//! Turns a coverage report into the per-test table, the cumulative
//! coverage curve and the headline totals shown to users.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use pairwise_explore::solver::CoverageReport;
use pairwise_ir::{Candidate, ParameterSet};

/// One row of the test case table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseRow {
    /// 1-based position in the suite.
    pub index: usize,
    pub values: Vec<String>,
    /// Pairs first covered by this test case.
    pub new_pairs: usize,
}

/// Coverage after a given test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoveragePoint {
    pub index: usize,
    pub covered: usize,
    pub total: usize,
    /// Coverage percentage (0.0-1.0).
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteAnalytics {
    /// Column headers, in parameter order.
    pub parameters: Vec<String>,
    pub total_pairs: usize,
    pub total_test_cases: usize,
    pub covered_pairs: usize,
    pub rows: Vec<TestCaseRow>,
    pub coverage_curve: Vec<CoveragePoint>,
    /// Shortest prefix of the suite reaching full coverage.
    pub tests_to_full_coverage: Option<usize>,
    /// Wall-clock elapsed seconds.
    pub elapsed_secs: f64,
}

impl SuiteAnalytics {
    pub fn from_report(
        parameters: &ParameterSet,
        suite: &[Candidate],
        report: &CoverageReport,
        total_pairs: usize,
    ) -> Self {
        let rows = suite
            .iter()
            .zip(&report.new_counts)
            .enumerate()
            .map(|(i, (candidate, &new_pairs))| TestCaseRow {
                index: i + 1,
                values: candidate.values.clone(),
                new_pairs,
            })
            .collect();

        let coverage_curve: Vec<CoveragePoint> = report
            .cumulative()
            .into_iter()
            .enumerate()
            .map(|(i, covered)| CoveragePoint {
                index: i + 1,
                covered,
                total: total_pairs,
                percent: fraction(covered, total_pairs),
            })
            .collect();

        let tests_to_full_coverage = if total_pairs == 0 {
            Some(0)
        } else {
            coverage_curve
                .iter()
                .find(|p| p.covered >= total_pairs)
                .map(|p| p.index)
        };

        Self {
            parameters: parameters.names().into_iter().map(str::to_string).collect(),
            total_pairs,
            total_test_cases: suite.len(),
            covered_pairs: report.covered.len(),
            rows,
            coverage_curve,
            tests_to_full_coverage,
            elapsed_secs: 0.0,
        }
    }

    pub fn set_elapsed(&mut self, secs: f64) {
        self.elapsed_secs = secs;
    }

    /// Final coverage percentage (0.0-1.0).
    pub fn coverage(&self) -> f64 {
        fraction(self.covered_pairs, self.total_pairs)
    }

    /// `Test Case #`, one column per parameter, then `New Unique Pairs`.
    pub fn table_headers(&self) -> Vec<String> {
        let mut headers = Vec::with_capacity(self.parameters.len() + 2);
        headers.push("Test Case #".to_string());
        headers.extend(self.parameters.iter().cloned());
        headers.push("New Unique Pairs".to_string());
        headers
    }

    pub fn table_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                let mut cells = Vec::with_capacity(row.values.len() + 2);
                cells.push(format!("Test {}", row.index));
                cells.extend(row.values.iter().cloned());
                cells.push(row.new_pairs.to_string());
                cells
            })
            .collect()
    }
}

fn fraction(part: usize, total: usize) -> f64 {
    if total > 0 {
        part as f64 / total as f64
    } else {
        1.0
    }
}

/// A simple wall-clock timer for one generation.
#[derive(Debug)]
pub struct GenerationTimer {
    start: Instant,
}

impl GenerationTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}
