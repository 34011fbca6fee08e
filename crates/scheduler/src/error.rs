// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the scheduler.

use std::path::PathBuf;

/// Errors that abort scheduler startup or a sweep.
///
/// Per-job problems (a failed execution, an unavailable runtime for one
/// model) are never errors at this level; they are counted or logged.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// The workload table is invalid.
    #[error("workload error: {0}")]
    WorkloadError(#[from] workload::WorkloadError),

    /// A backend call failed outside the preload phase.
    #[error("backend error: {0}")]
    BackendError(#[from] inference_backend::BackendError),

    /// Writing the results report failed.
    #[error("cannot write report '{}': {source}", path.display())]
    ReportError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A worker thread could not be spawned.
    #[error("failed to spawn worker for {runtime}: {source}")]
    SpawnError {
        runtime: inference_backend::RuntimeKind,
        #[source]
        source: std::io::Error,
    },

    /// The calling thread could not be pinned to a core.
    #[error("cannot pin thread to core {core}: {detail}")]
    PinError { core: usize, detail: String },
}
