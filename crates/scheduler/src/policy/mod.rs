// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Runtime-selection policies.
//!
//! | Policy | Rule |
//! |---|---|
//! | `CPU_ONLY` / `GPU_ONLY` / `DSP_ONLY` | the named runtime if available, else the first available |
//! | `RANDOM` | uniform over the available runtimes |
//! | `JSQ` | fewest queued requests, ties broken DSP > GPU > CPU |
//! | `DYNAMIC` | first runtime in DSP > GPU > CPU order whose predicted queueing delay fits the model's period, else JSQ |
//!
//! Every policy implements [`RuntimeSelector`]. Selectors are pure: the
//! only state they read is the [`LoadView`] they are handed, and they only
//! ever return a member of the input's available set.

pub mod dynamic;
pub mod fixed;
pub mod jsq;
pub mod random;

use inference_backend::RuntimeKind;
use rand::rngs::SmallRng;
use std::fmt;
use std::str::FromStr;

pub use dynamic::LatencyAware;
pub use fixed::FixedAffinity;
pub use jsq::ShortestQueue;
pub use random::UniformRandom;

/// Read-only view of scheduler load.
///
/// Implemented by the scheduler context for live runs and by plain maps in
/// tests.
pub trait LoadView {
    /// Pending requests on `runtime`'s queue; `0` for unknown runtimes.
    fn queue_depth(&self, runtime: RuntimeKind) -> usize;

    /// Smoothed execution latency of `model` on `runtime`, in ms.
    fn latency_ms(&self, model: &str, runtime: RuntimeKind) -> f64;
}

/// Everything a selector needs to place one job.
#[derive(Debug, Clone, Copy)]
pub struct SelectionInput<'a> {
    /// Model identifier.
    pub model: &'a str,
    /// Runtimes with a preloaded handle for this model, in preload order.
    pub available: &'a [RuntimeKind],
    /// Queueing-delay budget in ms (the model's inter-arrival period).
    pub slack_ms: f64,
}

impl SelectionInput<'_> {
    pub fn is_available(&self, runtime: RuntimeKind) -> bool {
        self.available.contains(&runtime)
    }
}

/// A runtime-selection strategy.
pub trait RuntimeSelector: Send + Sync {
    /// Human-readable name of this policy.
    fn name(&self) -> &str;

    /// Picks a runtime from `input.available`.
    ///
    /// Returns `None` only when nothing is available.
    fn select(
        &self,
        input: &SelectionInput<'_>,
        load: &dyn LoadView,
        rng: &mut SmallRng,
    ) -> Option<RuntimeKind>;
}

/// The scheduling policies compared by the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Policy {
    CpuOnly,
    GpuOnly,
    DspOnly,
    Random,
    Jsq,
    Dynamic,
}

impl Policy {
    /// All policies in sweep order.
    pub const ALL: [Policy; 6] = [
        Policy::CpuOnly,
        Policy::GpuOnly,
        Policy::DspOnly,
        Policy::Random,
        Policy::Jsq,
        Policy::Dynamic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Policy::CpuOnly => "CPU_ONLY",
            Policy::GpuOnly => "GPU_ONLY",
            Policy::DspOnly => "DSP_ONLY",
            Policy::Random => "RANDOM",
            Policy::Jsq => "JSQ",
            Policy::Dynamic => "DYNAMIC",
        }
    }

    /// Creates the selector implementing this policy.
    pub fn selector(&self) -> Box<dyn RuntimeSelector> {
        match self {
            Policy::CpuOnly => Box::new(FixedAffinity::new(RuntimeKind::Cpu)),
            Policy::GpuOnly => Box::new(FixedAffinity::new(RuntimeKind::Gpu)),
            Policy::DspOnly => Box::new(FixedAffinity::new(RuntimeKind::Dsp)),
            Policy::Random => Box::new(UniformRandom),
            Policy::Jsq => Box::new(ShortestQueue),
            Policy::Dynamic => Box::new(LatencyAware),
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Policy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_uppercase().replace('-', "_");
        Policy::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == norm)
            .ok_or_else(|| {
                format!(
                    "unknown policy '{s}'; expected one of {}",
                    Policy::ALL.map(|p| p.as_str()).join(", ")
                )
            })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;

    /// A fixed load snapshot.
    #[derive(Debug, Default)]
    pub struct StaticLoad {
        pub depths: HashMap<RuntimeKind, usize>,
        pub latency: HashMap<RuntimeKind, f64>,
    }

    impl StaticLoad {
        pub fn depths(pairs: &[(RuntimeKind, usize)]) -> Self {
            Self {
                depths: pairs.iter().copied().collect(),
                latency: HashMap::new(),
            }
        }

        pub fn with_latency(mut self, runtime: RuntimeKind, ms: f64) -> Self {
            self.latency.insert(runtime, ms);
            self
        }
    }

    impl LoadView for StaticLoad {
        fn queue_depth(&self, runtime: RuntimeKind) -> usize {
            self.depths.get(&runtime).copied().unwrap_or(0)
        }

        fn latency_ms(&self, _model: &str, runtime: RuntimeKind) -> f64 {
            self.latency.get(&runtime).copied().unwrap_or(1.0)
        }
    }
}
