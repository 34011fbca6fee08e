// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and shared setup.

pub mod preload;
pub mod scaffold;
pub mod scenarios;
pub mod sweep;

use inference_backend::{RuntimeKind, SimulatedBackend, SimulatedConfig};
use scheduler::SchedulerConfig;
use std::path::Path;
use workload::ScenarioTable;

/// Initialises the tracing subscriber from the `-v` count.
///
/// `RUST_LOG` takes precedence when set.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .init();
}

/// Simulated-engine settings shared by `sweep` and `preload`.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub present: String,
    pub failure_rate: f64,
    pub jitter: f64,
    pub latency_scale: f64,
}

impl EngineOptions {
    pub fn build(&self, seed: Option<u64>) -> anyhow::Result<SimulatedBackend> {
        let present = RuntimeKind::parse_list(&self.present)
            .map_err(|e| anyhow::anyhow!("invalid --present: {e}"))?;
        if !(0.0..=1.0).contains(&self.failure_rate) {
            anyhow::bail!("--failure-rate must be in [0, 1], got {}", self.failure_rate);
        }
        if !self.jitter.is_finite() || self.jitter < 0.0 {
            anyhow::bail!("--jitter must be finite and non-negative, got {}", self.jitter);
        }
        if !self.latency_scale.is_finite() || self.latency_scale < 0.0 {
            anyhow::bail!(
                "--latency-scale must be finite and non-negative, got {}",
                self.latency_scale
            );
        }
        Ok(SimulatedBackend::new(SimulatedConfig {
            present,
            failure_rate: self.failure_rate,
            jitter: self.jitter,
            latency_scale: self.latency_scale,
            seed,
        }))
    }
}

/// Loads the scheduler config, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<SchedulerConfig> {
    match path {
        Some(p) => SchedulerConfig::from_file(p)
            .map_err(|e| anyhow::anyhow!("failed to load config '{}': {e}", p.display())),
        None => Ok(SchedulerConfig::default()),
    }
}

/// Loads a workload table, or the built-in one when no file is given.
pub fn load_workload(path: Option<&Path>) -> anyhow::Result<ScenarioTable> {
    match path {
        Some(p) => ScenarioTable::from_file(p)
            .map_err(|e| anyhow::anyhow!("failed to load workload '{}': {e}", p.display())),
        None => Ok(ScenarioTable::builtin()),
    }
}

/// Splits a comma-separated list and parses each item.
pub fn parse_csv_list<T>(s: &str, what: &str) -> anyhow::Result<Vec<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    s.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<T>()
                .map_err(|e| anyhow::anyhow!("invalid {what} '{item}': {e}"))
        })
        .collect()
}

/// Formats a runtime list as `CPU, DSP`, or `-` when empty.
pub fn runtime_list(runtimes: &[RuntimeKind]) -> String {
    if runtimes.is_empty() {
        return "-".to_string();
    }
    runtimes
        .iter()
        .map(|rt| rt.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Truncates a string to max_len characters.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
