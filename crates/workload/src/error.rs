// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for workload configuration.

/// Errors raised while loading or validating a scenario table.
#[derive(Debug, thiserror::Error)]
pub enum WorkloadError {
    /// The workload file could not be read.
    #[error("cannot read workload '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The TOML is malformed.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The table defines no scenarios.
    #[error("scenario table is empty")]
    Empty,

    /// A scenario or one of its models is invalid.
    #[error("invalid scenario '{scenario}': {detail}")]
    InvalidScenario { scenario: String, detail: String },
}
