// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `sched-rt sweep` command: compare scheduling policies.
//!
//! Preloads the workload's models on the simulated engine, runs every
//! (scenario, scale, policy) combination, streams rows into the CSV report,
//! and prints a comparison table with the best policy per load level.

use super::{load_config, load_workload, parse_csv_list, runtime_list, truncate, EngineOptions};
use inference_backend::RuntimeKind;
use scheduler::{Policy, ReportWriter, ScenarioDriver};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Arguments of `sched-rt sweep`, after clap parsing.
#[derive(Debug)]
pub struct SweepArgs {
    pub config: Option<PathBuf>,
    pub workload: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub json: Option<PathBuf>,
    pub duration_ms: Option<u64>,
    pub scales: Option<String>,
    pub policies: Option<String>,
    pub backends: Option<String>,
    pub seed: Option<u64>,
    pub no_pin: bool,
    pub engine: EngineOptions,
}

pub fn execute(args: SweepArgs) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║              sched-rt · Policy Sweep                ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    // Command-line flags override the config file.
    let mut config = load_config(args.config.as_deref())?;
    if let Some(ms) = args.duration_ms {
        config.run_duration_ms = ms;
    }
    if let Some(s) = &args.scales {
        config.scales = parse_csv_list::<f64>(s, "scale")?;
    }
    if let Some(p) = &args.policies {
        config.policies = parse_csv_list::<Policy>(p, "policy")?;
    }
    if let Some(b) = &args.backends {
        config.backends =
            RuntimeKind::parse_list(b).map_err(|e| anyhow::anyhow!("invalid --backends: {e}"))?;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.no_pin {
        config.pin_workers = false;
    }
    if let Some(out) = args.output {
        config.report_path = out;
    }
    config.validate()?;

    let table = load_workload(args.workload.as_deref())?;
    let backend = args.engine.build(config.seed)?;

    let runs = table.iter().count() * config.scales.len() * config.policies.len();
    let per_run_s = config.run_duration().as_secs_f64();
    println!("  Backends:   {}", runtime_list(&config.backends));
    println!("  Scales:     {:?}", config.scales);
    println!(
        "  Policies:   {}",
        config.policies.iter().map(|p| p.as_str()).collect::<Vec<_>>().join(", ")
    );
    println!(
        "  Runs:       {runs} × {per_run_s:.1} s (+ up to {:.1} s drain each)",
        config.drain_timeout().as_secs_f64()
    );
    println!("  Report:     {}", config.report_path.display());
    println!();

    let mut driver = ScenarioDriver::new(Arc::new(backend), table, config.clone())?;
    println!("  Seed:       {}", driver.seed());
    println!();

    // ── Availability ───────────────────────────────────────────
    println!("  Availability");
    for (model, runtimes) in driver.context().registry().availability_table() {
        println!("   {:<44} {}", truncate(&model, 44), runtime_list(&runtimes));
    }
    println!();

    let mut writer = ReportWriter::create(&config.report_path)?;
    tracing::info!(runs, report = %config.report_path.display(), "sweep started");
    let started = Instant::now();
    let report = driver.sweep(&mut writer)?;
    let workers = driver.shutdown();

    // ── Results ────────────────────────────────────────────────
    println!(
        "  {:<20} {:>6} {:<10} {:>8} {:>8} {:>8} {:>6} {:>7}",
        "Scenario", "Scale", "Policy", "Miss %", "Issued", "Missed", "Late", "Failed",
    );
    println!("  {}", "-".repeat(82));
    for row in &report.rows {
        println!(
            "  {:<20} {:>6.2} {:<10} {:>7.2}% {:>8} {:>8} {:>6} {:>7}",
            truncate(&row.scenario, 20),
            row.scale,
            row.policy.as_str(),
            row.miss_rate,
            row.issued,
            row.missed,
            row.late,
            row.failed,
        );
    }
    println!();

    println!("  Best policy per load level");
    for row in report.best_policies() {
        println!(
            "   {:<20} ×{:<5} {:<10} {:.2}%",
            truncate(&row.scenario, 20),
            row.scale,
            row.policy.as_str(),
            row.miss_rate,
        );
    }
    println!();

    println!("  Workers");
    for w in &workers {
        let core = w.core.map_or_else(|| "unpinned".to_string(), |c| format!("core {c}"));
        println!(
            "   {:<4} {:<9} executed {:>7}  failed {:>5}",
            w.runtime.as_str(),
            core,
            w.executed,
            w.failed,
        );
    }
    println!();

    if let Some(json_path) = args.json {
        std::fs::write(&json_path, report.to_json()?).map_err(|e| {
            anyhow::anyhow!("cannot write JSON report '{}': {e}", json_path.display())
        })?;
        println!("  JSON:       {}", json_path.display());
    }
    println!("  CSV:        {}", config.report_path.display());
    println!("  Elapsed:    {:.1} s", started.elapsed().as_secs_f64());

    Ok(())
}
