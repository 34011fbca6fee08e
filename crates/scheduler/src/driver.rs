// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The scenario sweep.
//!
//! ```text
//! preload ─► spawn workers ─► for scenario × scale × policy:
//!                                 clear queues
//!                                 generate for run_duration
//!                                 wait until idle (≤ drain_timeout)
//!                                 drain leftovers, count expired as misses
//!                                 emit report row
//!                             ─► stop latch ─► join workers
//! ```
//!
//! Worker threads are created once and serve every run.

use crate::config::SchedulerConfig;
use crate::context::SchedulerContext;
use crate::generator::{stream_period, JobGenerator};
use crate::latency::LatencyTracker;
use crate::metrics::{RunOutcome, RunStats};
use crate::policy::Policy;
use crate::registry::ModelRegistry;
use crate::report::{ReportRow, ReportWriter, SweepReport};
use crate::worker::{WorkerPlacement, WorkerPool, WorkerStats};
use crate::SchedulerError;
use inference_backend::{InferenceBackend, RuntimeKind};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;
use workload::{Scenario, ScenarioTable};

/// Runs scheduling policies against workload scenarios.
pub struct ScenarioDriver<B: InferenceBackend> {
    config: SchedulerConfig,
    table: Arc<ScenarioTable>,
    ctx: Arc<SchedulerContext<B>>,
    workers: Option<WorkerPool>,
    rng: SmallRng,
    seed: u64,
}

impl<B: InferenceBackend> ScenarioDriver<B> {
    /// Validates the inputs, preloads every model and starts the workers.
    ///
    /// Invalid configuration or workload is reported before any thread is
    /// started.
    pub fn new(
        backend: Arc<B>,
        table: ScenarioTable,
        config: SchedulerConfig,
    ) -> Result<Self, SchedulerError> {
        config.validate()?;
        table.validate()?;
        check_periods(&table, &config.scales)?;

        let registry =
            ModelRegistry::preload(backend.as_ref(), table.unique_models(), &config.backends);
        tracing::info!(
            models = registry.model_count(),
            handles = registry.handle_count(),
            "preload complete"
        );

        let latency = LatencyTracker::new(
            registry.availability_table().into_iter().map(|(model, _)| model),
            config.ema_sample_weight,
        );
        let ctx = Arc::new(SchedulerContext::new(
            backend,
            registry,
            latency,
            &config.backends,
        ));

        let placements: Vec<WorkerPlacement> = config
            .backends
            .iter()
            .enumerate()
            .map(|(i, rt)| WorkerPlacement {
                runtime: *rt,
                core: config.pin_workers.then(|| config.worker_core(i)),
            })
            .collect();
        let workers = WorkerPool::spawn(&ctx, &placements)?;

        let seed = config.resolve_seed();
        tracing::debug!(seed, "scheduler rng seeded");

        Ok(Self {
            config,
            table: Arc::new(table),
            ctx,
            workers: Some(workers),
            rng: SmallRng::seed_from_u64(seed),
            seed,
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn context(&self) -> &SchedulerContext<B> {
        &self.ctx
    }

    pub fn scenarios(&self) -> &ScenarioTable {
        &self.table
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Runs one (scenario, scale, policy) combination.
    pub fn run_one(
        &mut self,
        scenario: &Scenario,
        scale: f64,
        policy: Policy,
    ) -> Result<RunOutcome, SchedulerError> {
        let started = Instant::now();
        self.ctx.clear_queues();

        let stats = Arc::new(RunStats::default());
        let selector = policy.selector();
        let generation = JobGenerator::new(&self.ctx, scenario, scale)?.run(
            selector.as_ref(),
            self.config.run_duration(),
            &stats,
            &mut self.rng,
        );

        let idle = self.wait_for_idle();
        let drain = self.ctx.drain_expired(Instant::now());
        if !idle {
            tracing::debug!(
                in_flight = self.ctx.in_flight(),
                discarded = drain.discarded,
                "drain watchdog expired"
            );
        }

        let queued_misses = drain.expired as u64;
        let abandoned = (drain.discarded - drain.expired) as u64;
        let outcome = stats.snapshot(queued_misses, abandoned, started.elapsed());
        tracing::info!(
            scenario = %scenario.name,
            scale,
            policy = %policy,
            cpu = generation.dispatched_to(RuntimeKind::Cpu),
            gpu = generation.dispatched_to(RuntimeKind::Gpu),
            dsp = generation.dispatched_to(RuntimeKind::Dsp),
            "{}",
            outcome.summary()
        );
        Ok(outcome)
    }

    /// Sleeps in short steps until the scheduler is idle or the watchdog
    /// expires. Returns whether it became idle.
    fn wait_for_idle(&self) -> bool {
        let deadline = Instant::now() + self.config.drain_timeout();
        loop {
            if self.ctx.is_idle() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(self.config.drain_poll_interval());
        }
    }

    /// Runs every configured combination, writing each row as it finishes.
    pub fn sweep<W: Write>(
        &mut self,
        writer: &mut ReportWriter<W>,
    ) -> Result<SweepReport, SchedulerError> {
        let table = Arc::clone(&self.table);
        let scales = self.config.scales.clone();
        let policies = self.config.policies.clone();
        let mut report = SweepReport::new(self.seed);

        for scenario in table.iter() {
            tracing::info!(scenario = %scenario.name, models = scenario.models.len(), "scenario started");
            for &scale in &scales {
                for &policy in &policies {
                    let outcome = self.run_one(scenario, scale, policy)?;
                    let row = ReportRow::new(&scenario.name, scale, policy, &outcome);
                    writer.write_row(&row)?;
                    report.push(row);
                }
            }
        }
        Ok(report)
    }

    /// Stops and joins the workers.
    pub fn shutdown(mut self) -> Vec<WorkerStats> {
        self.stop_workers()
    }

    fn stop_workers(&mut self) -> Vec<WorkerStats> {
        let Some(workers) = self.workers.take() else {
            return Vec::new();
        };
        self.ctx.shutdown();
        let stats = workers.join();
        tracing::info!(workers = stats.len(), "workers stopped");
        stats
    }
}

/// Every model must have a schedulable period at every configured scale.
fn check_periods(table: &ScenarioTable, scales: &[f64]) -> Result<(), SchedulerError> {
    for scenario in table.iter() {
        for model in &scenario.models {
            for &scale in scales {
                stream_period(model, scale).map_err(|e| match e {
                    SchedulerError::ConfigError(msg) => {
                        SchedulerError::ConfigError(format!("scenario '{}': {msg}", scenario.name))
                    }
                    other => other,
                })?;
            }
        }
    }
    Ok(())
}

impl<B: InferenceBackend> Drop for ScenarioDriver<B> {
    fn drop(&mut self) {
        self.stop_workers();
    }
}

impl<B: InferenceBackend> std::fmt::Debug for ScenarioDriver<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioDriver")
            .field("config", &self.config)
            .field("context", &self.ctx)
            .field("seed", &self.seed)
            .finish()
    }
}
