// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`InferenceBackend`] capability trait.

use crate::{BackendError, RuntimeKind};
use std::path::Path;
use std::time::Duration;

/// Whether the engine should create persistent-cache artifacts while
/// building an executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    Disabled,
    Enabled,
}

/// The result of one synchronous execution.
#[derive(Debug, Clone)]
pub struct ExecutionOutput {
    /// Number of output elements produced.
    pub output_elements: usize,
    /// Time spent inside the engine.
    pub elapsed: Duration,
}

/// Minimal interface to an inference engine.
///
/// The scheduler treats the engine as a black box: handles are built once
/// during preload and then only executed. Implementations must allow
/// `execute` to be called from worker threads while other threads hold
/// shared references to the backend.
pub trait InferenceBackend: Send + Sync + 'static {
    /// A loaded, not yet built, model container.
    type Container;
    /// A runtime-bound executable handle.
    type Executable: Send + Sync + 'static;
    /// A sample input bound to an executable.
    type Input: Send + Sync + 'static;

    /// Returns `true` if the runtime exists on this host.
    fn is_runtime_available(&self, runtime: RuntimeKind) -> bool;

    /// Loads a model container from disk.
    fn load_container(&self, path: &Path) -> Result<Self::Container, BackendError>;

    /// Builds an executable handle targeting `runtime`.
    fn build_executable(
        &self,
        container: &mut Self::Container,
        runtime: RuntimeKind,
        cache: CacheMode,
    ) -> Result<Self::Executable, BackendError>;

    /// Writes cache artifacts held by the container back to `path`.
    fn persist_container(&self, container: &Self::Container, path: &Path)
        -> Result<(), BackendError>;

    /// Reads a sample input from the manifest and binds it to the handle.
    fn bind_input(
        &self,
        executable: &Self::Executable,
        manifest: &Path,
    ) -> Result<Self::Input, BackendError>;

    /// Runs inference synchronously.
    fn execute(
        &self,
        executable: &Self::Executable,
        input: &Self::Input,
    ) -> Result<ExecutionOutput, BackendError>;
}
