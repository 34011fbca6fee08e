// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! End-to-end runs against the simulated backend.

use inference_backend::{ModelContainer, RuntimeKind, SimulatedBackend, SimulatedConfig};
use scheduler::{
    Policy, ReportWriter, ScenarioDriver, SchedulerConfig, SchedulerError, WorkerStats, CSV_HEADER,
};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use workload::{ModelSpec, Scenario, ScenarioTable};

const ELEMENTS: usize = 8;

/// Writes a simulated container, one raw input and a manifest for `name`.
fn model(dir: &Path, name: &str, latency: &[(RuntimeKind, f64)], rate: f64, probability: f64) -> ModelSpec {
    let mut container = ModelContainer::new(name, ELEMENTS);
    for (rt, ms) in latency {
        container = container.with_latency(*rt, *ms);
    }
    let container_path = dir.join(format!("{name}.toml"));
    container.write_to(&container_path).unwrap();

    let raw: Vec<u8> = (0..ELEMENTS).flat_map(|i| (i as f32).to_le_bytes()).collect();
    std::fs::write(dir.join(format!("{name}.raw")), raw).unwrap();
    let manifest = dir.join(format!("{name}.txt"));
    std::fs::write(&manifest, format!("# sample input\ninput:={name}.raw\n")).unwrap();

    ModelSpec::new(container_path, rate, probability, manifest)
}

fn everywhere(ms: f64) -> Vec<(RuntimeKind, f64)> {
    RuntimeKind::ALL.iter().map(|rt| (*rt, ms)).collect()
}

fn config(dir: &TempDir, backends: &[RuntimeKind], policies: &[Policy]) -> SchedulerConfig {
    SchedulerConfig {
        backends: backends.to_vec(),
        scales: vec![1.0],
        run_duration_ms: 150,
        drain_timeout_ms: 1_000,
        drain_poll_interval_ms: 2,
        seed: Some(7),
        pin_workers: false,
        policies: policies.to_vec(),
        report_path: dir.path().join("results.csv"),
        ..Default::default()
    }
}

fn backend(failure_rate: f64) -> Arc<SimulatedBackend> {
    Arc::new(SimulatedBackend::new(SimulatedConfig {
        failure_rate,
        seed: Some(11),
        ..Default::default()
    }))
}

fn single(name: &str, models: Vec<ModelSpec>) -> ScenarioTable {
    ScenarioTable::new(vec![Scenario::new(name, models)]).unwrap()
}

fn worker(stats: &[WorkerStats], runtime: RuntimeKind) -> WorkerStats {
    *stats.iter().find(|s| s.runtime == runtime).unwrap()
}

#[test]
fn test_sweep_writes_one_row_per_combination_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let table = single("Mix", vec![model(dir.path(), "a", &everywhere(1.0), 40.0, 1.0)]);
    let mut cfg = config(&dir, &RuntimeKind::ALL, &[Policy::CpuOnly, Policy::Dynamic]);
    cfg.scales = vec![0.5, 2.0];
    cfg.run_duration_ms = 60;

    let mut driver = ScenarioDriver::new(backend(0.0), table, cfg.clone()).unwrap();
    let mut writer = ReportWriter::create(&cfg.report_path).unwrap();
    let report = driver.sweep(&mut writer).unwrap();
    drop(writer);
    driver.shutdown();

    assert_eq!(report.len(), 4);
    assert_eq!(report.seed, 7);
    let text = std::fs::read_to_string(&cfg.report_path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], CSV_HEADER);
    let keys: Vec<String> = lines[1..]
        .iter()
        .map(|l| l.split(',').take(3).collect::<Vec<_>>().join(","))
        .collect();
    assert_eq!(
        keys,
        vec![
            "Mix,0.5,CPU_ONLY",
            "Mix,0.5,DYNAMIC",
            "Mix,2,CPU_ONLY",
            "Mix,2,DYNAMIC"
        ]
    );
}

#[test]
fn test_light_load_has_no_misses() {
    let dir = tempfile::tempdir().unwrap();
    let table = single(
        "Light",
        vec![
            model(dir.path(), "a", &everywhere(1.0), 50.0, 1.0),
            model(dir.path(), "b", &everywhere(1.0), 20.0, 1.0),
        ],
    );
    let cfg = config(&dir, &RuntimeKind::ALL, &[Policy::Jsq]);
    let mut driver = ScenarioDriver::new(backend(0.0), table, cfg).unwrap();
    let scenario = driver.scenarios().get("Light").cloned().unwrap();

    let outcome = driver.run_one(&scenario, 1.0, Policy::Jsq).unwrap();
    assert!(outcome.issued > 0);
    assert_eq!(outcome.misses(), 0);
    assert_eq!(outcome.miss_rate(), 0.0);
    assert_eq!(outcome.completed, outcome.issued);
    assert!(driver.context().is_idle());
}

#[test]
fn test_overload_leaves_expired_requests_as_misses() {
    let dir = tempfile::tempdir().unwrap();
    // 100 Hz with a 30 ms execution time on a single CPU worker.
    let table = single("Heavy", vec![model(dir.path(), "slow", &everywhere(30.0), 100.0, 1.0)]);
    let mut cfg = config(&dir, &[RuntimeKind::Cpu], &[Policy::CpuOnly]);
    cfg.drain_timeout_ms = 10;
    let mut driver = ScenarioDriver::new(backend(0.0), table, cfg).unwrap();
    let scenario = driver.scenarios().get("Heavy").cloned().unwrap();

    let outcome = driver.run_one(&scenario, 1.0, Policy::CpuOnly).unwrap();
    assert!(outcome.issued >= 10);
    assert!(outcome.queued_misses > 0);
    assert!(outcome.late_completions >= 1);
    assert!(outcome.miss_rate() > 0.0 && outcome.miss_rate() <= 100.0);
    // Leftovers were drained from the queue.
    assert_eq!(driver.context().queued(), 0);
}

#[test]
fn test_model_without_runtimes_is_never_issued() {
    let dir = tempfile::tempdir().unwrap();
    let ghost = ModelSpec::new(dir.path().join("ghost.toml"), 100.0, 1.0, dir.path().join("ghost.txt"));
    let table = ScenarioTable::new(vec![
        Scenario::new("Ghost", vec![ghost.clone()]),
        Scenario::new(
            "Mixed",
            vec![ghost.clone(), model(dir.path(), "real", &everywhere(1.0), 30.0, 1.0)],
        ),
    ])
    .unwrap();
    let cfg = config(&dir, &RuntimeKind::ALL, &[Policy::Random]);
    let mut driver = ScenarioDriver::new(backend(0.0), table, cfg).unwrap();
    assert!(driver.context().registry().available(&ghost.id()).is_empty());

    let only_ghost = driver.scenarios().get("Ghost").cloned().unwrap();
    let outcome = driver.run_one(&only_ghost, 1.0, Policy::Random).unwrap();
    assert_eq!(outcome.issued, 0);
    assert_eq!(outcome.miss_rate(), 0.0);

    let mixed = driver.scenarios().get("Mixed").cloned().unwrap();
    let outcome = driver.run_one(&mixed, 1.0, Policy::Random).unwrap();
    assert!(outcome.issued > 0);

    let stats = driver.shutdown();
    let executed: u64 = stats.iter().map(|s| s.executed).sum();
    let skipped: u64 = stats.iter().map(|s| s.skipped).sum();
    assert_eq!(executed, outcome.issued);
    assert_eq!(skipped, 0);
}

#[test]
fn test_single_backend_scheduler_routes_everything_to_it() {
    let dir = tempfile::tempdir().unwrap();
    let table = single("Solo", vec![model(dir.path(), "a", &everywhere(1.0), 50.0, 1.0)]);
    let cfg = config(&dir, &[RuntimeKind::Gpu], &[Policy::Jsq]);
    let mut driver = ScenarioDriver::new(backend(0.0), table, cfg).unwrap();
    assert_eq!(driver.context().backends(), vec![RuntimeKind::Gpu]);
    assert_eq!(
        driver.context().registry().availability_table()[0].1,
        vec![RuntimeKind::Gpu]
    );

    let scenario = driver.scenarios().get("Solo").cloned().unwrap();
    // DSP_ONLY falls back to the only available runtime.
    let outcome = driver.run_one(&scenario, 1.0, Policy::DspOnly).unwrap();
    assert!(outcome.issued > 0);

    let stats = driver.shutdown();
    assert_eq!(stats.len(), 1);
    assert_eq!(worker(&stats, RuntimeKind::Gpu).executed, outcome.issued);
}

#[test]
fn test_failed_executions_count_as_misses() {
    let dir = tempfile::tempdir().unwrap();
    let table = single("Broken", vec![model(dir.path(), "a", &everywhere(1.0), 50.0, 1.0)]);
    let cfg = config(&dir, &RuntimeKind::ALL, &[Policy::Jsq]);
    let mut driver = ScenarioDriver::new(backend(1.0), table, cfg).unwrap();
    let scenario = driver.scenarios().get("Broken").cloned().unwrap();

    let outcome = driver.run_one(&scenario, 1.0, Policy::Jsq).unwrap();
    assert!(outcome.issued > 0);
    assert_eq!(outcome.failures, outcome.issued);
    assert_eq!(outcome.completed, 0);
    assert_eq!(outcome.miss_rate(), 100.0);
}

#[test]
fn test_dynamic_prefers_dsp_and_learns_its_latency() {
    let dir = tempfile::tempdir().unwrap();
    let spec = model(
        dir.path(),
        "det",
        &[(RuntimeKind::Cpu, 2.0), (RuntimeKind::Gpu, 2.0), (RuntimeKind::Dsp, 5.0)],
        20.0,
        1.0,
    );
    let table = single("Dyn", vec![spec.clone()]);
    let cfg = config(&dir, &RuntimeKind::ALL, &[Policy::Dynamic]);
    let mut driver = ScenarioDriver::new(backend(0.0), table, cfg).unwrap();
    let scenario = driver.scenarios().get("Dyn").cloned().unwrap();

    let outcome = driver.run_one(&scenario, 1.0, Policy::Dynamic).unwrap();
    assert!(outcome.issued > 0);
    assert_eq!(outcome.misses(), 0);
    let learned = driver.context().latency().average(&spec.id(), RuntimeKind::Dsp);
    assert!(learned > 1.0, "DSP average still at seed: {learned}");
    assert_eq!(driver.context().latency().average(&spec.id(), RuntimeKind::Cpu), 1.0);

    let stats = driver.shutdown();
    assert_eq!(worker(&stats, RuntimeKind::Dsp).executed, outcome.issued);
    assert_eq!(worker(&stats, RuntimeKind::Cpu).executed, 0);
    assert_eq!(worker(&stats, RuntimeKind::Gpu).executed, 0);
}

#[test]
fn test_invalid_config_rejected_before_start() {
    let dir = tempfile::tempdir().unwrap();
    let table = single("A", vec![model(dir.path(), "a", &everywhere(1.0), 5.0, 1.0)]);
    let mut cfg = config(&dir, &RuntimeKind::ALL, &[Policy::Jsq]);
    cfg.scales = vec![-1.0];
    assert!(ScenarioDriver::new(backend(0.0), table, cfg).is_err());
}

#[test]
fn test_unschedulable_period_rejected_before_start() {
    let dir = tempfile::tempdir().unwrap();
    // Valid on its own, but fire + period does not fit the clock.
    let table = single("Slow", vec![model(dir.path(), "slow", &everywhere(1.0), 1e-19, 1.0)]);
    let cfg = config(&dir, &RuntimeKind::ALL, &[Policy::Jsq]);
    assert!(matches!(
        ScenarioDriver::new(backend(0.0), table, cfg),
        Err(SchedulerError::ConfigError(_))
    ));

    // Fine at scale 1, but the period rounds to zero at the configured scale.
    let table = single("Fast", vec![model(dir.path(), "fast", &everywhere(1.0), 1e6, 1.0)]);
    let mut cfg = config(&dir, &RuntimeKind::ALL, &[Policy::Jsq]);
    cfg.scales = vec![1.0, 1e300];
    assert!(matches!(
        ScenarioDriver::new(backend(0.0), table, cfg),
        Err(SchedulerError::ConfigError(_))
    ));
}

#[test]
fn test_out_of_range_latency_scale_marks_pairs_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let spec = model(dir.path(), "kws", &everywhere(1.0), 20.0, 1.0);
    let id = spec.id();
    let table = single("A", vec![spec]);
    let engine = Arc::new(SimulatedBackend::new(SimulatedConfig {
        latency_scale: f64::INFINITY,
        seed: Some(11),
        ..Default::default()
    }));

    let cfg = config(&dir, &RuntimeKind::ALL, &[Policy::Jsq]);
    let mut driver = ScenarioDriver::new(engine, table.clone(), cfg).unwrap();
    assert_eq!(driver.context().registry().handle_count(), 0);
    assert!(driver.context().registry().available(&id).is_empty());

    let scenario = table.iter().next().unwrap().clone();
    let outcome = driver.run_one(&scenario, 1.0, Policy::Jsq).unwrap();
    assert_eq!(outcome.issued, 0);
    assert_eq!(outcome.miss_rate(), 0.0);
}
