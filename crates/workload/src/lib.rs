// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # workload
//!
//! Declarative description of periodic inference workloads.
//!
//! - [`ModelSpec`]: one stream: a model, a target rate, a fire
//!   probability, and the input manifest used to bind a sample input.
//! - [`Scenario`]: a named, ordered mix of streams that run concurrently.
//! - [`ScenarioTable`]: every scenario the sweep will visit, either the
//!   compiled-in [`ScenarioTable::builtin`] table or one loaded from TOML.
//!
//! # TOML Format
//! ```toml
//! [[scenario]]
//! name = "AR_Assistant"
//!
//! [[scenario.models]]
//! model = "models/KD_res8_narrow_quant.toml"
//! rate = 3.0
//! probability = 1.0
//! inputs = "input_lists/KD_res8_narrow.txt"
//! ```
//!
//! Tables are validated on load; a malformed table is a startup error.

mod error;
mod model;
mod scenario;

pub use error::WorkloadError;
pub use model::ModelSpec;
pub use scenario::{Scenario, ScenarioTable};
