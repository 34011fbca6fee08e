// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Periodic job generation.
//!
//! A single loop drives every model stream of a scenario. Each stream has
//! a fixed period `1 / (rate × scale)` and a next-fire instant starting at
//! the run's start.
//!
//! ```text
//! t0        t0+P       t0+2P      t0+3P
//! │ fire     │ gate✗      │ fire      │ ...
//! │ deadline = fire + P
//! ```
//!
//! Every due occurrence advances the stream by exactly one period, so a
//! late wake-up never accumulates drift. Between occurrences the loop
//! sleeps until the earliest next-fire instant instead of polling.

use crate::context::SchedulerContext;
use crate::metrics::RunStats;
use crate::policy::{RuntimeSelector, SelectionInput};
use crate::queue::Request;
use crate::SchedulerError;
use inference_backend::{InferenceBackend, RuntimeKind};
use rand::distributions::{Bernoulli, Distribution};
use rand::rngs::SmallRng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use workload::{ModelSpec, Scenario};

/// What one generation phase did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct GenerationSummary {
    /// Occurrences that came due.
    pub occurrences: u64,
    /// Occurrences skipped by the Bernoulli gate.
    pub gated: u64,
    /// Occurrences dropped because the model has no available runtime.
    pub unschedulable: u64,
    /// Requests enqueued, per runtime index.
    pub dispatched: [u64; 3],
}

impl GenerationSummary {
    pub fn issued(&self) -> u64 {
        self.dispatched.iter().sum()
    }

    pub fn dispatched_to(&self, runtime: RuntimeKind) -> u64 {
        self.dispatched[runtime.index()]
    }
}

struct Stream {
    spec: Arc<ModelSpec>,
    id: String,
    period: Duration,
    gate: Bernoulli,
    /// `None` once the next occurrence would overflow the clock.
    next_fire: Option<Instant>,
}

/// Period of `model` at `scale`, checked against the monotonic clock.
///
/// Rejects periods that round to zero and periods so long that the
/// next-fire instant or the deadline could not be represented.
pub(crate) fn stream_period(model: &ModelSpec, scale: f64) -> Result<Duration, SchedulerError> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(SchedulerError::ConfigError(format!(
            "scale must be positive, got {scale}"
        )));
    }
    let period = model.period(scale).map_err(SchedulerError::ConfigError)?;
    if Instant::now().checked_add(period.saturating_mul(2)).is_none() {
        return Err(SchedulerError::ConfigError(format!(
            "model '{}' at scale {scale} has a period of {period:?}, too long to schedule",
            model.short_name()
        )));
    }
    Ok(period)
}

/// Turns a scenario at a given scale into timed requests.
pub struct JobGenerator<'a, B: InferenceBackend> {
    ctx: &'a SchedulerContext<B>,
    streams: Vec<Stream>,
}

impl<'a, B: InferenceBackend> JobGenerator<'a, B> {
    /// Prepares one stream per model of `scenario`.
    pub fn new(
        ctx: &'a SchedulerContext<B>,
        scenario: &Scenario,
        scale: f64,
    ) -> Result<Self, SchedulerError> {
        let start = Instant::now();
        let streams = scenario
            .models
            .iter()
            .map(|m| {
                let gate = Bernoulli::new(m.probability).map_err(|e| {
                    SchedulerError::ConfigError(format!(
                        "model '{}' has invalid probability {}: {e}",
                        m.short_name(),
                        m.probability
                    ))
                })?;
                Ok(Stream {
                    spec: Arc::new(m.clone()),
                    id: m.id(),
                    period: stream_period(m, scale)?,
                    gate,
                    next_fire: Some(start),
                })
            })
            .collect::<Result<Vec<_>, SchedulerError>>()?;
        Ok(Self { ctx, streams })
    }

    /// Generates requests for `duration` of wall-clock time.
    ///
    /// Every enqueued request carries `stats` and is counted in it.
    pub fn run(
        &mut self,
        selector: &dyn RuntimeSelector,
        duration: Duration,
        stats: &Arc<RunStats>,
        rng: &mut SmallRng,
    ) -> GenerationSummary {
        let mut summary = GenerationSummary::default();
        let start = Instant::now();
        let Some(end) = start.checked_add(duration) else {
            tracing::warn!(?duration, "run duration overflows the clock, nothing generated");
            return summary;
        };
        for s in &mut self.streams {
            s.next_fire = Some(start);
        }

        loop {
            let now = Instant::now();
            if now >= end {
                break;
            }

            for i in 0..self.streams.len() {
                while let Some(fire_at) = self.streams[i].next_fire.filter(|t| *t <= now) {
                    let period = self.streams[i].period;
                    let next = fire_at.checked_add(period);
                    self.streams[i].next_fire = next;
                    summary.occurrences += 1;
                    match next {
                        Some(deadline) => self.fire(i, deadline, selector, stats, rng, &mut summary),
                        None => {
                            tracing::warn!(model = %self.streams[i].id, "period overflows the clock, stream retired");
                            summary.unschedulable += 1;
                        }
                    }
                }
            }

            let wake = self
                .streams
                .iter()
                .filter_map(|s| s.next_fire)
                .min()
                .map_or(end, |t| t.min(end));
            let now = Instant::now();
            if wake > now {
                std::thread::sleep(wake - now);
            }
        }

        tracing::debug!(
            occurrences = summary.occurrences,
            gated = summary.gated,
            unschedulable = summary.unschedulable,
            issued = summary.issued(),
            "generation finished"
        );
        summary
    }

    /// Handles one due occurrence. `deadline` is its fire instant plus one
    /// period.
    fn fire(
        &self,
        index: usize,
        deadline: Instant,
        selector: &dyn RuntimeSelector,
        stats: &Arc<RunStats>,
        rng: &mut SmallRng,
        summary: &mut GenerationSummary,
    ) {
        let stream = &self.streams[index];
        if !stream.gate.sample(rng) {
            summary.gated += 1;
            return;
        }

        let input = SelectionInput {
            model: &stream.id,
            available: self.ctx.registry().available(&stream.id),
            slack_ms: stream.period.as_secs_f64() * 1000.0,
        };
        let Some(runtime) = selector.select(&input, self.ctx, rng) else {
            summary.unschedulable += 1;
            return;
        };
        let Some(queue) = self.ctx.queue(runtime) else {
            summary.unschedulable += 1;
            return;
        };

        stats.record_issued();
        summary.dispatched[runtime.index()] += 1;
        queue.push(Request {
            model: Arc::clone(&stream.spec),
            runtime,
            deadline,
            stats: Arc::clone(stats),
        });
    }
}
