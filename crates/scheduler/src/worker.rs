// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! One execution thread per backend.
//!
//! Workers live for the whole sweep. Each one blocks on its runtime's
//! queue, executes requests synchronously on the preloaded handle, and
//! feeds the observed latency back into the tracker. A worker exits once
//! its queue is empty and the stop latch is set.

use crate::affinity::pin_current_thread;
use crate::context::SchedulerContext;
use crate::SchedulerError;
use inference_backend::{InferenceBackend, RuntimeKind};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

/// Lifetime counters of one worker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct WorkerStats {
    pub runtime: RuntimeKind,
    /// Core the worker was pinned to, if pinning succeeded.
    pub core: Option<usize>,
    pub executed: u64,
    pub failed: u64,
    /// Requests with no preloaded handle.
    pub skipped: u64,
}

/// Where to run the worker for one backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPlacement {
    pub runtime: RuntimeKind,
    /// Core to pin to; `None` leaves the thread unpinned.
    pub core: Option<usize>,
}

/// The set of worker threads of one scheduler.
#[derive(Debug)]
pub struct WorkerPool {
    handles: Vec<(RuntimeKind, JoinHandle<WorkerStats>)>,
}

impl WorkerPool {
    /// Spawns one worker per placement.
    ///
    /// If any spawn fails, the workers already started are stopped and
    /// joined before the error is returned.
    pub fn spawn<B: InferenceBackend>(
        ctx: &Arc<SchedulerContext<B>>,
        placements: &[WorkerPlacement],
    ) -> Result<Self, SchedulerError> {
        let mut pool = Self {
            handles: Vec::with_capacity(placements.len()),
        };
        for placement in placements {
            let worker_ctx = Arc::clone(ctx);
            let placement = *placement;
            let spawned = std::thread::Builder::new()
                .name(format!("worker-{}", placement.runtime.as_str().to_lowercase()))
                .spawn(move || run_worker(&worker_ctx, placement));
            match spawned {
                Ok(handle) => pool.handles.push((placement.runtime, handle)),
                Err(source) => {
                    ctx.shutdown();
                    pool.join();
                    return Err(SchedulerError::SpawnError {
                        runtime: placement.runtime,
                        source,
                    });
                }
            }
        }
        tracing::info!(workers = pool.len(), "worker pool started");
        Ok(pool)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Waits for every worker to exit. The stop latch must already be set.
    pub fn join(self) -> Vec<WorkerStats> {
        self.handles
            .into_iter()
            .filter_map(|(runtime, handle)| match handle.join() {
                Ok(stats) => Some(stats),
                Err(_) => {
                    tracing::error!(runtime = %runtime, "worker thread panicked");
                    None
                }
            })
            .collect()
    }
}

fn run_worker<B: InferenceBackend>(ctx: &SchedulerContext<B>, placement: WorkerPlacement) -> WorkerStats {
    let runtime = placement.runtime;
    let core = placement.core.and_then(|core| match pin_current_thread(core) {
        Ok(()) => {
            tracing::debug!(runtime = %runtime, core, "worker pinned");
            Some(core)
        }
        Err(e) => {
            tracing::warn!(runtime = %runtime, core, error = %e, "running worker unpinned");
            None
        }
    });

    let mut stats = WorkerStats {
        runtime,
        core,
        executed: 0,
        failed: 0,
        skipped: 0,
    };
    let Some(queue) = ctx.queue(runtime) else {
        tracing::warn!(runtime = %runtime, "no queue for worker runtime");
        return stats;
    };

    while let Some((request, _in_flight)) = queue.pop_tracked(ctx.in_flight_counter()) {
        let model = request.model.id();
        let Some(handle) = ctx.registry().handle(&model, runtime) else {
            stats.skipped += 1;
            continue;
        };

        let start = Instant::now();
        match ctx.backend().execute(&handle.executable, &handle.input) {
            Ok(_) => {
                let finished = Instant::now();
                let elapsed_ms = finished.duration_since(start).as_secs_f64() * 1000.0;
                ctx.latency().record(&model, runtime, elapsed_ms);
                request.stats.record_completion(request.is_expired(finished));
                stats.executed += 1;
            }
            Err(e) => {
                tracing::debug!(runtime = %runtime, model = %model, error = %e, "execution failed");
                request.stats.record_failure();
                stats.failed += 1;
            }
        }
    }

    tracing::debug!(
        runtime = %runtime,
        executed = stats.executed,
        failed = stats.failed,
        "worker exiting"
    );
    stats
}
