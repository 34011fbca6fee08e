// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-run outcome counters.
//!
//! [`RunStats`] is shared between the generator, the workers, and the
//! driver for one (scenario, scale, policy) run. Every request carries an
//! `Arc` to the stats of the run that issued it, so work that outlives a
//! run's drain window can never leak into the next run's numbers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Live counters for one run.
#[derive(Debug, Default)]
pub struct RunStats {
    issued: AtomicU64,
    completed: AtomicU64,
    late_completions: AtomicU64,
    failures: AtomicU64,
}

impl RunStats {
    pub fn record_issued(&self) {
        self.issued.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a successful execution; `late` if it finished past its deadline.
    pub fn record_completion(&self, late: bool) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        if late {
            self.late_completions.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }

    /// Freezes the counters together with the drain results.
    pub fn snapshot(&self, queued_misses: u64, abandoned: u64, elapsed: Duration) -> RunOutcome {
        RunOutcome {
            issued: self.issued(),
            completed: self.completed.load(Ordering::Relaxed),
            late_completions: self.late_completions.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            queued_misses,
            abandoned,
            elapsed,
        }
    }
}

/// Final numbers for one run.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct RunOutcome {
    /// Requests enqueued by the generator.
    pub issued: u64,
    /// Requests executed successfully.
    pub completed: u64,
    /// Successful executions that finished after their deadline.
    pub late_completions: u64,
    /// Executions the engine reported as failed.
    pub failures: u64,
    /// Requests still queued at drain time with an expired deadline.
    pub queued_misses: u64,
    /// Requests still queued at drain time whose deadline had not passed.
    pub abandoned: u64,
    /// Wall-clock duration of generation plus drain.
    pub elapsed: Duration,
}

impl RunOutcome {
    /// Misses: expired requests left in queues plus failed executions.
    pub fn misses(&self) -> u64 {
        self.queued_misses + self.failures
    }

    /// `100 × misses / issued`, or `0` when nothing was issued.
    pub fn miss_rate(&self) -> f64 {
        miss_rate(self.misses(), self.issued)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} issued, {} completed ({} late), {} failed, {} expired in queue, \
             {} abandoned, miss rate {:.2}% in {:.2}s",
            self.issued,
            self.completed,
            self.late_completions,
            self.failures,
            self.queued_misses,
            self.abandoned,
            self.miss_rate(),
            self.elapsed.as_secs_f64(),
        )
    }
}

/// `100 × misses / issued`, or `0` when `issued == 0`.
pub fn miss_rate(misses: u64, issued: u64) -> f64 {
    if issued == 0 {
        return 0.0;
    }
    100.0 * misses as f64 / issued as f64
}
