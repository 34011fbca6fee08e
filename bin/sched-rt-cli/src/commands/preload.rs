// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `sched-rt preload` command: build every handle and show availability.
//!
//! Useful before a sweep to check which (model, runtime) pairs will
//! actually be schedulable on this host.

use super::{load_config, load_workload, runtime_list, truncate, EngineOptions};
use scheduler::ModelRegistry;
use std::path::PathBuf;
use std::time::Instant;

pub fn execute(
    config: Option<PathBuf>,
    workload: Option<PathBuf>,
    engine: EngineOptions,
) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║             sched-rt · Model Preloader              ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let config = load_config(config.as_deref())?;
    let table = load_workload(workload.as_deref())?;
    let backend = engine.build(config.seed)?;

    let start = Instant::now();
    let registry = ModelRegistry::preload(&backend, table.unique_models(), &config.backends);
    let elapsed = start.elapsed();

    println!("  Backends tried: {}", runtime_list(&config.backends));
    println!(
        "  Built {} handle(s) for {} model(s) in {:.1} ms",
        registry.handle_count(),
        registry.model_count(),
        elapsed.as_secs_f64() * 1000.0,
    );
    println!();

    println!("  {:<44} {}", "Model", "Available runtimes");
    println!("  {}", "-".repeat(70));
    for (model, runtimes) in registry.availability_table() {
        println!("  {:<44} {}", truncate(&model, 44), runtime_list(&runtimes));
    }
    println!();

    if !registry.failures().is_empty() {
        println!("  Unavailable pairs");
        for f in registry.failures() {
            println!(
                "   {:<4} {:<36} {}",
                f.runtime.as_str(),
                truncate(&f.model, 36),
                f.error,
            );
        }
        println!();
    }

    Ok(())
}
