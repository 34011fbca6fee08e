// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the inference backend boundary.

use crate::RuntimeKind;

/// Errors reported by an [`crate::InferenceBackend`].
///
/// Every variant except [`BackendError::ExecutionFailed`] means "this
/// (model, runtime) pair is unavailable" to the preloader.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The model container file does not exist.
    #[error("model container not found: {path}")]
    ContainerMissing { path: String },

    /// The model container exists but could not be parsed.
    #[error("invalid model container '{path}': {detail}")]
    ContainerInvalid { path: String, detail: String },

    /// The requested runtime is not present on this host.
    #[error("runtime {0} is not available on this host")]
    RuntimeUnavailable(RuntimeKind),

    /// Building the executable handle failed.
    #[error("failed to build '{model}' for {runtime}: {detail}")]
    BuildFailed {
        model: String,
        runtime: RuntimeKind,
        detail: String,
    },

    /// The sample input does not match what the network expects.
    #[error("input mismatch for '{model}': expected {expected} elements, got {actual}")]
    InputMismatch {
        model: String,
        expected: usize,
        actual: usize,
    },

    /// The input manifest is malformed or empty.
    #[error("input manifest '{path}': {detail}")]
    Manifest { path: String, detail: String },

    /// Underlying file I/O failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The engine reported an error while executing.
    #[error("execution failed for '{model}' on {runtime}: {detail}")]
    ExecutionFailed {
        model: String,
        runtime: RuntimeKind,
        detail: String,
    },
}

impl BackendError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
