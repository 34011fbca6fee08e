// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # inference-backend
//!
//! The boundary between the scheduler and the neural-network execution
//! engine. The scheduler never touches an engine directly; it talks to an
//! [`InferenceBackend`], which exposes exactly four capabilities:
//!
//! - query whether a [`RuntimeKind`] exists on this host,
//! - build an executable handle for a (model container, runtime) pair,
//! - bind a sample input read from an input manifest,
//! - execute synchronously.
//!
//! # Components
//! - [`RuntimeKind`]: CPU / GPU / DSP and the fixed preference order.
//! - [`InferenceBackend`]: the capability trait.
//! - [`InputManifest`]: the line-oriented input list format.
//! - [`SimulatedBackend`]: a deterministic fake engine with configurable
//!   latency and failure injection, used by the CLI and the tests.
//!
//! # Example
//! ```no_run
//! use inference_backend::{CacheMode, InferenceBackend, RuntimeKind, SimulatedBackend, SimulatedConfig};
//! use std::path::Path;
//!
//! let backend = SimulatedBackend::new(SimulatedConfig::default());
//! let mut container = backend.load_container(Path::new("models/kws.toml")).unwrap();
//! let exe = backend
//!     .build_executable(&mut container, RuntimeKind::Dsp, CacheMode::Enabled)
//!     .unwrap();
//! let input = backend.bind_input(&exe, Path::new("input_lists/kws.txt")).unwrap();
//! let out = backend.execute(&exe, &input).unwrap();
//! println!("{:.2} ms", out.elapsed.as_secs_f64() * 1000.0);
//! ```

mod backend;
mod error;
pub mod manifest;
mod runtime;
mod simulated;

pub use backend::{CacheMode, ExecutionOutput, InferenceBackend};
pub use error::BackendError;
pub use manifest::{load_float_file, InputBatch, InputManifest};
pub use runtime::RuntimeKind;
pub use simulated::{LatencyTable, ModelContainer, SimulatedBackend, SimulatedConfig, SimulatedExecutable, SimulatedInput};
