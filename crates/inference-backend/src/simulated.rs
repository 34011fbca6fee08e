// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! A deterministic fake inference engine.
//!
//! [`SimulatedBackend`] stands in for real accelerator hardware. Model
//! containers are small TOML files that declare the expected input size
//! and a per-runtime execution latency:
//!
//! ```toml
//! name = "KD_res8_narrow"
//! input_elements = 4200
//! cached = ["dsp"]
//!
//! [latency_ms]
//! cpu = 12.0
//! gpu = 6.5
//! dsp = 2.0
//! ```
//!
//! A runtime missing from `latency_ms` cannot be built for that model.
//! Building with [`CacheMode::Enabled`] records the runtime under `cached`,
//! which [`InferenceBackend::persist_container`] writes back to the file.

use crate::manifest::{load_float_file, InputManifest};
use crate::{BackendError, CacheMode, ExecutionOutput, InferenceBackend, RuntimeKind};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Per-runtime latency in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LatencyTable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dsp: Option<f64>,
}

impl LatencyTable {
    pub fn get(&self, runtime: RuntimeKind) -> Option<f64> {
        match runtime {
            RuntimeKind::Cpu => self.cpu,
            RuntimeKind::Gpu => self.gpu,
            RuntimeKind::Dsp => self.dsp,
        }
    }

    pub fn set(&mut self, runtime: RuntimeKind, ms: f64) {
        let slot = match runtime {
            RuntimeKind::Cpu => &mut self.cpu,
            RuntimeKind::Gpu => &mut self.gpu,
            RuntimeKind::Dsp => &mut self.dsp,
        };
        *slot = Some(ms);
    }
}

/// A simulated model container, deserialised from TOML.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ModelContainer {
    /// Model name.
    pub name: String,
    /// Number of `f32` elements the network expects as input.
    pub input_elements: usize,
    /// Runtimes for which cache artifacts have been created.
    #[serde(default)]
    pub cached: Vec<RuntimeKind>,
    /// Execution latency per supported runtime.
    #[serde(default)]
    pub latency_ms: LatencyTable,
}

impl ModelContainer {
    /// Creates a container with no supported runtimes.
    pub fn new(name: impl Into<String>, input_elements: usize) -> Self {
        Self {
            name: name.into(),
            input_elements,
            cached: Vec::new(),
            latency_ms: LatencyTable::default(),
        }
    }

    /// Adds a supported runtime with the given latency.
    pub fn with_latency(mut self, runtime: RuntimeKind, ms: f64) -> Self {
        self.latency_ms.set(runtime, ms);
        self
    }

    /// Parses a container from TOML.
    pub fn from_toml(s: &str, path: &Path) -> Result<Self, BackendError> {
        toml::from_str(s).map_err(|e| BackendError::ContainerInvalid {
            path: path.display().to_string(),
            detail: e.to_string(),
        })
    }

    /// Writes the container as TOML to `path`.
    pub fn write_to(&self, path: &Path) -> Result<(), BackendError> {
        let text = toml::to_string_pretty(self).map_err(|e| BackendError::ContainerInvalid {
            path: path.display().to_string(),
            detail: format!("TOML serialise error: {e}"),
        })?;
        std::fs::write(path, text).map_err(|e| BackendError::io(path, e))
    }
}

/// Knobs for the simulated engine.
#[derive(Debug, Clone)]
pub struct SimulatedConfig {
    /// Runtimes that exist on the simulated host.
    pub present: Vec<RuntimeKind>,
    /// Probability in `[0, 1]` that an execution fails.
    pub failure_rate: f64,
    /// Relative latency jitter; `0.1` means ±10%. Capped at 1.0.
    pub jitter: f64,
    /// Multiplier applied to every container latency.
    pub latency_scale: f64,
    /// RNG seed; `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            present: RuntimeKind::ALL.to_vec(),
            failure_rate: 0.0,
            jitter: 0.0,
            latency_scale: 1.0,
            seed: None,
        }
    }
}

/// Executable handle produced by [`SimulatedBackend`].
#[derive(Debug, Clone)]
pub struct SimulatedExecutable {
    pub model: String,
    pub runtime: RuntimeKind,
    pub latency: Duration,
    pub input_elements: usize,
}

/// Bound sample input.
#[derive(Debug, Clone)]
pub struct SimulatedInput {
    pub data: Vec<f32>,
}

/// Fake engine that sleeps for the configured latency.
pub struct SimulatedBackend {
    config: SimulatedConfig,
    rng: Mutex<SmallRng>,
}

impl SimulatedBackend {
    pub fn new(config: SimulatedConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self {
            config,
            rng: Mutex::new(rng),
        }
    }

    pub fn config(&self) -> &SimulatedConfig {
        &self.config
    }

    /// Draws the actual latency and whether this execution fails.
    fn draw(&self, base: Duration) -> (Duration, bool) {
        let jitter = if self.config.jitter.is_finite() {
            self.config.jitter.abs().min(1.0)
        } else {
            0.0
        };
        let failure_rate = if self.config.failure_rate.is_nan() {
            0.0
        } else {
            self.config.failure_rate.clamp(0.0, 1.0)
        };
        let Ok(mut rng) = self.rng.lock() else {
            return (base, false);
        };
        let factor = if jitter > 0.0 {
            (1.0 + rng.gen_range(-jitter..=jitter)).max(0.0)
        } else {
            1.0
        };
        let fail = failure_rate > 0.0 && rng.gen_bool(failure_rate);
        let latency = Duration::try_from_secs_f64(base.as_secs_f64() * factor).unwrap_or(base);
        (latency, fail)
    }
}

impl std::fmt::Debug for SimulatedBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedBackend")
            .field("config", &self.config)
            .finish()
    }
}

impl InferenceBackend for SimulatedBackend {
    type Container = ModelContainer;
    type Executable = SimulatedExecutable;
    type Input = SimulatedInput;

    fn is_runtime_available(&self, runtime: RuntimeKind) -> bool {
        self.config.present.contains(&runtime)
    }

    fn load_container(&self, path: &Path) -> Result<ModelContainer, BackendError> {
        if !path.exists() {
            return Err(BackendError::ContainerMissing {
                path: path.display().to_string(),
            });
        }
        let text = std::fs::read_to_string(path).map_err(|e| BackendError::io(path, e))?;
        ModelContainer::from_toml(&text, path)
    }

    fn build_executable(
        &self,
        container: &mut ModelContainer,
        runtime: RuntimeKind,
        cache: CacheMode,
    ) -> Result<SimulatedExecutable, BackendError> {
        if !self.is_runtime_available(runtime) {
            return Err(BackendError::RuntimeUnavailable(runtime));
        }
        let ms = container
            .latency_ms
            .get(runtime)
            .ok_or_else(|| BackendError::BuildFailed {
                model: container.name.clone(),
                runtime,
                detail: "no kernel support for this runtime".into(),
            })?;
        if !ms.is_finite() || ms < 0.0 {
            return Err(BackendError::BuildFailed {
                model: container.name.clone(),
                runtime,
                detail: format!("invalid latency {ms}"),
            });
        }

        let latency = Duration::try_from_secs_f64(ms * self.config.latency_scale.max(0.0) / 1000.0)
            .map_err(|e| BackendError::BuildFailed {
                model: container.name.clone(),
                runtime,
                detail: format!(
                    "latency {ms} ms × scale {} is out of range: {e}",
                    self.config.latency_scale
                ),
            })?;

        if cache == CacheMode::Enabled && !container.cached.contains(&runtime) {
            container.cached.push(runtime);
        }
        tracing::debug!(
            model = %container.name,
            runtime = %runtime,
            latency_ms = ms,
            ?cache,
            "built simulated executable"
        );

        Ok(SimulatedExecutable {
            model: container.name.clone(),
            runtime,
            latency,
            input_elements: container.input_elements,
        })
    }

    fn persist_container(&self, container: &ModelContainer, path: &Path) -> Result<(), BackendError> {
        container.write_to(path)
    }

    fn bind_input(
        &self,
        executable: &SimulatedExecutable,
        manifest: &Path,
    ) -> Result<SimulatedInput, BackendError> {
        let manifest = InputManifest::from_file(manifest)?;
        let file = manifest
            .first()
            .file_for("input", 0)
            .ok_or_else(|| BackendError::Manifest {
                path: executable.model.clone(),
                detail: "first batch is empty".into(),
            })?;
        let data = load_float_file(file)?;
        if data.len() != executable.input_elements {
            return Err(BackendError::InputMismatch {
                model: executable.model.clone(),
                expected: executable.input_elements,
                actual: data.len(),
            });
        }
        Ok(SimulatedInput { data })
    }

    fn execute(
        &self,
        executable: &SimulatedExecutable,
        input: &SimulatedInput,
    ) -> Result<ExecutionOutput, BackendError> {
        let start = Instant::now();
        let (latency, fail) = self.draw(executable.latency);
        if !latency.is_zero() {
            std::thread::sleep(latency);
        }
        if fail {
            return Err(BackendError::ExecutionFailed {
                model: executable.model.clone(),
                runtime: executable.runtime,
                detail: "injected failure".into(),
            });
        }
        Ok(ExecutionOutput {
            output_elements: input.data.len(),
            elapsed: start.elapsed(),
        })
    }
}
