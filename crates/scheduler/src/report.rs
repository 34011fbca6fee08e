// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Sweep results: one row per (scenario, scale, policy).
//!
//! [`ReportWriter`] appends rows to a CSV sink as they are produced and
//! flushes after each one, so a crash mid-sweep keeps every finished row.
//!
//! ```text
//! scenario,scale,policy,miss_rate,issued,missed,late,failed
//! AR_Assistant,0.5,CPU_ONLY,12.5,216,27,3,0
//! ```

use crate::metrics::RunOutcome;
use crate::policy::Policy;
use crate::SchedulerError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const CSV_HEADER: &str = "scenario,scale,policy,miss_rate,issued,missed,late,failed";

/// Outcome of one run.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ReportRow {
    pub scenario: String,
    pub scale: f64,
    pub policy: Policy,
    /// `100 × missed / issued`.
    pub miss_rate: f64,
    pub issued: u64,
    pub missed: u64,
    /// Completed after the deadline; not part of `missed`.
    pub late: u64,
    /// Failed executions; part of `missed`.
    pub failed: u64,
}

impl ReportRow {
    pub fn new(scenario: &str, scale: f64, policy: Policy, outcome: &RunOutcome) -> Self {
        Self {
            scenario: scenario.to_string(),
            scale,
            policy,
            miss_rate: outcome.miss_rate(),
            issued: outcome.issued,
            missed: outcome.misses(),
            late: outcome.late_completions,
            failed: outcome.failures,
        }
    }

    /// The row as one CSV line, without the trailing newline.
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{}",
            csv_field(&self.scenario),
            self.scale,
            self.policy,
            self.miss_rate,
            self.issued,
            self.missed,
            self.late,
            self.failed
        )
    }
}

fn csv_field(s: &str) -> String {
    if s.contains(|c: char| matches!(c, ',' | '"' | '\n')) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Incremental CSV writer.
pub struct ReportWriter<W: Write> {
    out: W,
    path: PathBuf,
    header_written: bool,
}

impl ReportWriter<BufWriter<File>> {
    /// Creates (truncating) the report file at `path`.
    pub fn create(path: &Path) -> Result<Self, SchedulerError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| SchedulerError::ReportError {
                path: path.to_path_buf(),
                source,
            })?;
        }
        let file = File::create(path).map_err(|source| SchedulerError::ReportError {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufWriter::new(file), path))
    }
}

impl<W: Write> ReportWriter<W> {
    /// Wraps an arbitrary sink; `path` is only used in error messages.
    pub fn new(out: W, path: impl Into<PathBuf>) -> Self {
        Self {
            out,
            path: path.into(),
            header_written: false,
        }
    }

    /// Appends one row, writing the header first if needed, then flushes.
    pub fn write_row(&mut self, row: &ReportRow) -> Result<(), SchedulerError> {
        self.append(row).map_err(|source| SchedulerError::ReportError {
            path: self.path.clone(),
            source,
        })
    }

    fn append(&mut self, row: &ReportRow) -> std::io::Result<()> {
        if !self.header_written {
            writeln!(self.out, "{CSV_HEADER}")?;
            self.header_written = true;
        }
        writeln!(self.out, "{}", row.to_csv_line())?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Every row of a sweep, in the order the runs happened.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct SweepReport {
    pub seed: u64,
    pub rows: Vec<ReportRow>,
}

impl SweepReport {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: ReportRow) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The policy with the lowest miss rate for each (scenario, scale),
    /// earliest row winning ties.
    pub fn best_policies(&self) -> Vec<&ReportRow> {
        let mut best: Vec<&ReportRow> = Vec::new();
        for row in &self.rows {
            match best
                .iter_mut()
                .find(|b| b.scenario == row.scenario && b.scale == row.scale)
            {
                Some(b) if row.miss_rate < b.miss_rate => *b = row,
                Some(_) => {}
                None => best.push(row),
            }
        }
        best
    }

    /// The whole report as CSV text.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();
        csv.push_str(CSV_HEADER);
        csv.push('\n');
        for row in &self.rows {
            csv.push_str(&row.to_csv_line());
            csv.push('\n');
        }
        csv
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn outcome(issued: u64, queued_misses: u64, failures: u64, late: u64) -> RunOutcome {
        RunOutcome {
            issued,
            completed: issued - queued_misses - failures,
            late_completions: late,
            failures,
            queued_misses,
            abandoned: 0,
            elapsed: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_row_from_outcome() {
        let row = ReportRow::new("AR", 1.5, Policy::Dynamic, &outcome(100, 5, 2, 4));
        assert_eq!(row.missed, 7);
        assert_eq!(row.miss_rate, 7.0);
        assert_eq!(row.to_csv_line(), "AR,1.5,DYNAMIC,7,100,7,4,2");
    }

    #[test]
    fn test_header_written_once_and_flushed() {
        let mut w = ReportWriter::new(Vec::new(), "mem");
        w.write_row(&ReportRow::new("A", 0.5, Policy::CpuOnly, &outcome(0, 0, 0, 0)))
            .unwrap();
        w.write_row(&ReportRow::new("A", 0.5, Policy::Jsq, &outcome(8, 2, 0, 0)))
            .unwrap();
        let text = String::from_utf8(w.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "A,0.5,CPU_ONLY,0,0,0,0,0");
        assert_eq!(lines[2], "A,0.5,JSQ,25,8,2,0,0");
    }

    #[test]
    fn test_file_rows_survive_each_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/results.csv");
        let mut w = ReportWriter::create(&path).unwrap();
        w.write_row(&ReportRow::new("A", 1.0, Policy::Random, &outcome(4, 1, 0, 0)))
            .unwrap();
        // Readable before the writer is dropped.
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, format!("{CSV_HEADER}\nA,1,RANDOM,25,4,1,0,0\n"));
    }

    #[test]
    fn test_quotes_awkward_names() {
        let row = ReportRow::new("a,b", 1.0, Policy::Jsq, &outcome(0, 0, 0, 0));
        assert!(row.to_csv_line().starts_with("\"a,b\",1,JSQ"));
    }

    #[test]
    fn test_best_policies_and_json() {
        let mut report = SweepReport::new(9);
        report.push(ReportRow::new("A", 1.0, Policy::CpuOnly, &outcome(10, 5, 0, 0)));
        report.push(ReportRow::new("A", 1.0, Policy::Dynamic, &outcome(10, 1, 0, 0)));
        report.push(ReportRow::new("A", 2.0, Policy::Jsq, &outcome(10, 0, 0, 0)));
        report.push(ReportRow::new("A", 2.0, Policy::Random, &outcome(10, 0, 0, 0)));
        let best = report.best_policies();
        assert_eq!(best.len(), 2);
        assert_eq!(best[0].policy, Policy::Dynamic);
        assert_eq!(best[1].policy, Policy::Jsq);

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["seed"], 9);
        assert_eq!(json["rows"][1]["policy"], "DYNAMIC");
        assert_eq!(report.to_csv().lines().count(), 5);
    }
}
