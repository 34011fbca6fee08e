// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # scheduler
//!
//! Dispatches periodic inference jobs across heterogeneous runtimes (CPU,
//! GPU, DSP) under a pluggable selection policy, and measures the
//! deadline-miss rate each policy achieves.
//!
//! ```text
//!                 ┌──────────────┐   select   ┌─────────────────┐
//! Scenario ──────►│ JobGenerator │──────────►│ RuntimeSelector │
//!                 └──────┬───────┘            └────────┬────────┘
//!                        │ push                        │ queue depth,
//!          ┌─────────────┼─────────────┐               │ latency EMA
//!          ▼             ▼             ▼               │
//!     [CPU queue]   [GPU queue]   [DSP queue] ◄────────┘
//!          │             │             │
//!     worker-cpu    worker-gpu    worker-dsp ──► InferenceBackend::execute
//!          └─────────────┴─────────────┴──► LatencyTracker
//! ```
//!
//! The [`ScenarioDriver`] owns the whole pipeline: it preloads a
//! [`ModelRegistry`], starts one [`WorkerPool`] thread per backend, and runs
//! every (scenario, scale, policy) combination, writing one report row per
//! run.
//!
//! All shared state lives in a [`SchedulerContext`] passed to each thread,
//! so several independent schedulers can coexist in one process.

mod affinity;
mod config;
mod context;
mod driver;
mod error;
mod generator;
mod latency;
mod metrics;
pub mod policy;
mod queue;
mod registry;
mod report;
mod worker;

pub use affinity::pin_current_thread;
pub use config::SchedulerConfig;
pub use context::SchedulerContext;
pub use driver::ScenarioDriver;
pub use error::SchedulerError;
pub use generator::{GenerationSummary, JobGenerator};
pub use latency::{LatencyRecord, LatencyTracker, DEFAULT_SAMPLE_WEIGHT, INITIAL_LATENCY_MS};
pub use metrics::{miss_rate, RunOutcome, RunStats};
pub use policy::{LoadView, Policy, RuntimeSelector, SelectionInput};
pub use queue::{DrainCount, InFlightGuard, Request, RuntimeQueue};
pub use registry::{ExecutionHandle, ModelRegistry, PreloadFailure};
pub use report::{ReportRow, ReportWriter, SweepReport, CSV_HEADER};
pub use worker::{WorkerPlacement, WorkerPool, WorkerStats};
