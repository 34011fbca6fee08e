// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Preloading and the model registry.
//!
//! ```text
//! for model in unique models:
//!     for runtime in configured backends:
//!         runtime present?  ── no ──► unavailable
//!         load container    ── err ─► unavailable
//!         build (cache on)  ── err ─► unavailable
//!         persist container ── err ─► warn, continue
//!         bind sample input ── err ─► unavailable
//!         ──► ExecutionHandle, runtime added to availability
//! ```
//!
//! The registry is written once here and is read-only afterwards, so
//! workers and the generator share it through an `Arc` without locking.

use inference_backend::{BackendError, CacheMode, InferenceBackend, RuntimeKind};
use std::collections::HashMap;
use std::sync::Arc;
use workload::ModelSpec;

/// A built executable with its bound sample input.
pub struct ExecutionHandle<B: InferenceBackend> {
    pub executable: B::Executable,
    pub input: B::Input,
}

impl<B: InferenceBackend> std::fmt::Debug for ExecutionHandle<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionHandle").finish_non_exhaustive()
    }
}

struct ModelEntry<B: InferenceBackend> {
    model: String,
    available: Vec<RuntimeKind>,
    handles: HashMap<RuntimeKind, Arc<ExecutionHandle<B>>>,
}

/// Why one (model, runtime) pair was left out of the registry.
#[derive(Debug)]
pub struct PreloadFailure {
    pub model: String,
    pub runtime: RuntimeKind,
    pub error: BackendError,
}

/// Executable handles per (model, runtime), built once at startup.
pub struct ModelRegistry<B: InferenceBackend> {
    entries: Vec<ModelEntry<B>>,
    index: HashMap<String, usize>,
    failures: Vec<PreloadFailure>,
}

impl<B: InferenceBackend> ModelRegistry<B> {
    /// Builds a handle for every model on every configured backend it
    /// supports.
    ///
    /// Per-pair failures are logged and recorded; they never abort the
    /// preload.
    pub fn preload<'a, I>(backend: &B, models: I, backends: &[RuntimeKind]) -> Self
    where
        I: IntoIterator<Item = &'a ModelSpec>,
    {
        let present: Vec<RuntimeKind> = backends
            .iter()
            .copied()
            .filter(|rt| {
                let ok = backend.is_runtime_available(*rt);
                if !ok {
                    tracing::warn!(runtime = %rt, "runtime not present on this host");
                }
                ok
            })
            .collect();

        let mut registry = Self {
            entries: Vec::new(),
            index: HashMap::new(),
            failures: Vec::new(),
        };

        for spec in models {
            let id = spec.id();
            if registry.index.contains_key(&id) {
                continue;
            }
            let mut entry = ModelEntry {
                model: id.clone(),
                available: Vec::new(),
                handles: HashMap::new(),
            };

            for &rt in backends {
                let attempt = if present.contains(&rt) {
                    Self::build_one(backend, spec, rt)
                } else {
                    Err(BackendError::RuntimeUnavailable(rt))
                };
                match attempt {
                    Ok(handle) => {
                        tracing::info!(model = %spec.short_name(), runtime = %rt, "preloaded");
                        entry.available.push(rt);
                        entry.handles.insert(rt, Arc::new(handle));
                    }
                    Err(error) => {
                        tracing::warn!(
                            model = %spec.short_name(),
                            runtime = %rt,
                            %error,
                            "runtime unavailable for model"
                        );
                        registry.failures.push(PreloadFailure {
                            model: id.clone(),
                            runtime: rt,
                            error,
                        });
                    }
                }
            }

            if entry.available.is_empty() {
                tracing::warn!(model = %spec.short_name(), "no runtime available; jobs will be dropped");
            }
            registry.index.insert(id, registry.entries.len());
            registry.entries.push(entry);
        }

        registry
    }

    fn build_one(
        backend: &B,
        spec: &ModelSpec,
        runtime: RuntimeKind,
    ) -> Result<ExecutionHandle<B>, BackendError> {
        let mut container = backend.load_container(spec.model_path())?;
        let executable = backend.build_executable(&mut container, runtime, CacheMode::Enabled)?;
        if let Err(e) = backend.persist_container(&container, spec.model_path()) {
            tracing::warn!(
                model = %spec.short_name(),
                runtime = %runtime,
                error = %e,
                "could not persist cache; continuing"
            );
        }
        let input = backend.bind_input(&executable, &spec.inputs)?;
        Ok(ExecutionHandle { executable, input })
    }

    /// Runtimes `model` can run on, in preload order. Empty for unknown models.
    pub fn available(&self, model: &str) -> &[RuntimeKind] {
        self.index
            .get(model)
            .map(|&i| self.entries[i].available.as_slice())
            .unwrap_or(&[])
    }

    /// The preloaded handle for (`model`, `runtime`), if one was built.
    pub fn handle(&self, model: &str, runtime: RuntimeKind) -> Option<&Arc<ExecutionHandle<B>>> {
        self.index
            .get(model)
            .and_then(|&i| self.entries[i].handles.get(&runtime))
    }

    /// Model identifiers with their available runtimes, in preload order.
    pub fn availability_table(&self) -> Vec<(String, Vec<RuntimeKind>)> {
        self.entries
            .iter()
            .map(|e| (e.model.clone(), e.available.clone()))
            .collect()
    }

    /// Pairs that could not be preloaded.
    pub fn failures(&self) -> &[PreloadFailure] {
        &self.failures
    }

    pub fn model_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of (model, runtime) handles built.
    pub fn handle_count(&self) -> usize {
        self.entries.iter().map(|e| e.handles.len()).sum()
    }
}

impl<B: InferenceBackend> std::fmt::Debug for ModelRegistry<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("models", &self.entries.len())
            .field("handles", &self.handle_count())
            .field("failures", &self.failures.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inference_backend::{ModelContainer, SimulatedBackend, SimulatedConfig};
    use std::path::{Path, PathBuf};

    fn write_model(dir: &Path, name: &str, latency: &[(RuntimeKind, f64)]) -> ModelSpec {
        let mut container = ModelContainer::new(name, 4);
        for (rt, ms) in latency {
            container = container.with_latency(*rt, *ms);
        }
        let model = dir.join(format!("{name}.toml"));
        container.write_to(&model).unwrap();

        let raw: Vec<u8> = [1.0f32, 2.0, 3.0, 4.0]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let input = dir.join(format!("{name}.raw"));
        std::fs::write(&input, raw).unwrap();
        let manifest = dir.join(format!("{name}.txt"));
        std::fs::write(&manifest, format!("{}\n", input.display())).unwrap();

        ModelSpec::new(model, 10.0, 1.0, manifest)
    }

    fn backend(present: Vec<RuntimeKind>) -> SimulatedBackend {
        SimulatedBackend::new(SimulatedConfig {
            present,
            seed: Some(1),
            ..Default::default()
        })
    }

    #[test]
    fn test_preload_all_runtimes() {
        let dir = tempfile::tempdir().unwrap();
        let spec = write_model(
            dir.path(),
            "a",
            &[(RuntimeKind::Cpu, 1.0), (RuntimeKind::Gpu, 1.0), (RuntimeKind::Dsp, 1.0)],
        );
        let reg = ModelRegistry::preload(&backend(RuntimeKind::ALL.to_vec()), [&spec], &RuntimeKind::ALL);
        assert_eq!(reg.available(&spec.id()), &RuntimeKind::ALL);
        assert_eq!(reg.handle_count(), 3);
        assert!(reg.failures().is_empty());

        // The cache was persisted back into the container.
        let text = std::fs::read_to_string(spec.model_path()).unwrap();
        let saved = ModelContainer::from_toml(&text, spec.model_path()).unwrap();
        assert_eq!(saved.cached.len(), 3);
    }

    #[test]
    fn test_unsupported_and_absent_runtimes_excluded() {
        let dir = tempfile::tempdir().unwrap();
        // No DSP latency entry: building for DSP fails.
        let spec = write_model(dir.path(), "b", &[(RuntimeKind::Cpu, 1.0), (RuntimeKind::Gpu, 1.0)]);
        // GPU not present on the host.
        let reg = ModelRegistry::preload(
            &backend(vec![RuntimeKind::Cpu, RuntimeKind::Dsp]),
            [&spec],
            &RuntimeKind::ALL,
        );
        assert_eq!(reg.available(&spec.id()), &[RuntimeKind::Cpu]);
        assert!(reg.handle(&spec.id(), RuntimeKind::Cpu).is_some());
        assert!(reg.handle(&spec.id(), RuntimeKind::Gpu).is_none());
        assert_eq!(reg.failures().len(), 2);
        assert!(reg
            .failures()
            .iter()
            .any(|f| f.runtime == RuntimeKind::Gpu && matches!(f.error, BackendError::RuntimeUnavailable(_))));
    }

    #[test]
    fn test_missing_container_gives_empty_entry() {
        let dir = tempfile::tempdir().unwrap();
        let spec = ModelSpec::new(
            dir.path().join("missing.toml"),
            5.0,
            1.0,
            PathBuf::from("none.txt"),
        );
        let reg = ModelRegistry::preload(&backend(RuntimeKind::ALL.to_vec()), [&spec], &RuntimeKind::ALL);
        assert!(reg.available(&spec.id()).is_empty());
        assert_eq!(reg.model_count(), 1);
        assert_eq!(reg.availability_table(), vec![(spec.id(), vec![])]);
    }

    #[test]
    fn test_bad_input_excludes_pair() {
        let dir = tempfile::tempdir().unwrap();
        let spec = write_model(dir.path(), "c", &[(RuntimeKind::Cpu, 1.0)]);
        // Three floats where four are expected.
        let raw: Vec<u8> = [1.0f32, 2.0, 3.0].iter().flat_map(|v| v.to_le_bytes()).collect();
        std::fs::write(dir.path().join("c.raw"), raw).unwrap();
        let reg = ModelRegistry::preload(&backend(RuntimeKind::ALL.to_vec()), [&spec], &[RuntimeKind::Cpu]);
        assert!(reg.available(&spec.id()).is_empty());
        assert!(matches!(reg.failures()[0].error, BackendError::InputMismatch { .. }));
    }

    #[test]
    fn test_only_configured_backends_tried() {
        let dir = tempfile::tempdir().unwrap();
        let spec = write_model(
            dir.path(),
            "d",
            &[(RuntimeKind::Cpu, 1.0), (RuntimeKind::Gpu, 1.0), (RuntimeKind::Dsp, 1.0)],
        );
        let reg = ModelRegistry::preload(
            &backend(RuntimeKind::ALL.to_vec()),
            [&spec, &spec],
            &[RuntimeKind::Dsp, RuntimeKind::Cpu],
        );
        assert_eq!(reg.available(&spec.id()), &[RuntimeKind::Dsp, RuntimeKind::Cpu]);
        assert_eq!(reg.model_count(), 1);
        assert!(reg.available("unknown").is_empty());
    }
}
