// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Scheduler configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! backends = ["cpu", "gpu", "dsp"]
//! scales = [0.5, 1.0, 1.5, 2.0]
//! run_duration_ms = 15000
//! drain_timeout_ms = 3000
//! drain_poll_interval_ms = 5
//! ema_sample_weight = 0.1
//! seed = 42
//! pin_workers = true
//! worker_cores = [0, 1, 2]
//! policies = ["CPU_ONLY", "GPU_ONLY", "DSP_ONLY", "RANDOM", "JSQ", "DYNAMIC"]
//! report_path = "results.csv"
//! ```
//!
//! Every key is optional; missing keys take the [`Default`] value.

use crate::latency::DEFAULT_SAMPLE_WEIGHT;
use crate::policy::Policy;
use crate::SchedulerError;
use inference_backend::RuntimeKind;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for a scheduling sweep.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Runtimes to create queues and workers for.
    pub backends: Vec<RuntimeKind>,
    /// Rate multipliers applied to every model of a scenario.
    pub scales: Vec<f64>,
    /// Generation phase length for one run.
    pub run_duration_ms: u64,
    /// Upper bound on waiting for in-flight work after generation stops.
    pub drain_timeout_ms: u64,
    /// How often the drain watchdog re-checks for idleness.
    pub drain_poll_interval_ms: u64,
    /// Weight of a new latency sample in the moving average.
    pub ema_sample_weight: f64,
    /// RNG seed for the generator and the `RANDOM` policy. Random when absent.
    pub seed: Option<u64>,
    /// Whether to pin each worker to its own core.
    pub pin_workers: bool,
    /// Explicit core per backend (same order as `backends`).
    /// Defaults to core `i` for the `i`-th backend.
    pub worker_cores: Option<Vec<usize>>,
    /// Policies to compare, in sweep order.
    pub policies: Vec<Policy>,
    /// Where the CSV results are written.
    pub report_path: PathBuf,
}

impl SchedulerConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, SchedulerError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SchedulerError::ConfigError(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, SchedulerError> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| SchedulerError::ConfigError(format!("TOML parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, SchedulerError> {
        toml::to_string_pretty(self)
            .map_err(|e| SchedulerError::ConfigError(format!("TOML serialise error: {e}")))
    }

    /// Checks every field for consistency.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        let err = |msg: String| Err(SchedulerError::ConfigError(msg));

        if self.backends.is_empty() {
            return err("at least one backend is required".into());
        }
        let mut seen = HashSet::new();
        for rt in &self.backends {
            if !seen.insert(*rt) {
                return err(format!("backend {rt} listed more than once"));
            }
        }
        if self.scales.is_empty() {
            return err("at least one scale is required".into());
        }
        if let Some(s) = self.scales.iter().find(|s| !s.is_finite() || **s <= 0.0) {
            return err(format!("scale must be positive and finite, got {s}"));
        }
        if self.policies.is_empty() {
            return err("at least one policy is required".into());
        }
        if self.run_duration_ms == 0 {
            return err("run_duration_ms must be > 0".into());
        }
        if self.drain_poll_interval_ms == 0 {
            return err("drain_poll_interval_ms must be > 0".into());
        }
        if !(self.ema_sample_weight > 0.0 && self.ema_sample_weight <= 1.0) {
            return err(format!(
                "ema_sample_weight must be in (0, 1], got {}",
                self.ema_sample_weight
            ));
        }
        if let Some(cores) = &self.worker_cores {
            if cores.len() < self.backends.len() {
                return err(format!(
                    "worker_cores lists {} cores for {} backends",
                    cores.len(),
                    self.backends.len()
                ));
            }
        }
        Ok(())
    }

    pub fn run_duration(&self) -> Duration {
        Duration::from_millis(self.run_duration_ms)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }

    pub fn drain_poll_interval(&self) -> Duration {
        Duration::from_millis(self.drain_poll_interval_ms)
    }

    /// Core the worker for the `index`-th backend is pinned to.
    pub fn worker_core(&self, index: usize) -> usize {
        self.worker_cores
            .as_ref()
            .and_then(|cores| cores.get(index).copied())
            .unwrap_or(index)
    }

    /// Resolves the RNG seed, drawing one from the OS when unset.
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            backends: RuntimeKind::ALL.to_vec(),
            scales: vec![0.5, 1.0, 1.5, 2.0],
            run_duration_ms: 15_000,
            drain_timeout_ms: 3_000,
            drain_poll_interval_ms: 5,
            ema_sample_weight: DEFAULT_SAMPLE_WEIGHT,
            seed: None,
            pin_workers: true,
            worker_cores: None,
            policies: Policy::ALL.to_vec(),
            report_path: PathBuf::from("results.csv"),
        }
    }
}
