// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `sched-rt scaffold` command: write a runnable demo tree.
//!
//! For every model of the workload this writes a simulated model container,
//! a raw `f32` sample input, and an input list pointing at it. A default
//! `scheduler.toml` and the workload itself as `workload.toml` are written
//! next to them, so `sched-rt -c scheduler.toml sweep -w workload.toml`
//! works from inside the directory.

use super::load_workload;
use inference_backend::{ModelContainer, RuntimeKind};
use scheduler::SchedulerConfig;
use std::path::{Path, PathBuf};
use workload::ModelSpec;

/// Per-runtime demo latency (ms) and input size for known model families.
fn demo_profile(name: &str) -> ([f64; 3], usize) {
    // [cpu, gpu, dsp]
    let table: [(&str, [f64; 3], usize); 5] = [
        ("KD_res8_narrow", [4.0, 3.0, 1.5], 490),
        ("ASR_EM_24L", [60.0, 35.0, 20.0], 1600),
        ("SS_HRViT_b1", [45.0, 25.0, 15.0], 3072),
        ("DE_midas_v21_small", [30.0, 18.0, 9.0], 3072),
        ("OD_D2go_FasterRCNN", [70.0, 40.0, 28.0], 3072),
    ];
    table
        .iter()
        .find(|(prefix, _, _)| name.starts_with(prefix))
        .map(|(_, ms, n)| (*ms, *n))
        .unwrap_or(([10.0, 6.0, 3.0], 1024))
}

pub fn execute(dir: PathBuf, workload: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║              sched-rt · Demo Scaffold               ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let table = load_workload(workload.as_deref())?;
    std::fs::create_dir_all(&dir)
        .map_err(|e| anyhow::anyhow!("cannot create '{}': {e}", dir.display()))?;

    let mut written = 0usize;
    let mut skipped = 0usize;
    for spec in table.unique_models() {
        if scaffold_model(&dir, spec, force)? {
            written += 1;
            println!("  wrote    {}", spec.model.display());
        } else {
            skipped += 1;
            println!("  exists   {}", spec.model.display());
        }
    }

    let config_path = dir.join("scheduler.toml");
    write_new(&config_path, &SchedulerConfig::default().to_toml()?, force)?;
    let workload_path = dir.join("workload.toml");
    write_new(&workload_path, &table.to_toml()?, force)?;
    println!();
    println!("  {written} model(s) written, {skipped} left untouched");
    println!("  Config:   {}", config_path.display());
    println!("  Workload: {}", workload_path.display());
    println!();
    println!(
        "  Try: cd {} && sched-rt -c scheduler.toml sweep -w workload.toml --duration-ms 2000",
        dir.display()
    );

    Ok(())
}

/// Writes the container, sample input and input list for one model.
/// Returns `false` when the container already exists and `force` is off.
fn scaffold_model(root: &Path, spec: &ModelSpec, force: bool) -> anyhow::Result<bool> {
    let container_path = root.join(&spec.model);
    if container_path.exists() && !force {
        return Ok(false);
    }

    let name = spec.short_name();
    let (latency, elements) = demo_profile(&name);
    let mut container = ModelContainer::new(&name, elements);
    for rt in RuntimeKind::ALL {
        container = container.with_latency(rt, latency[rt.index()]);
    }
    create_parent(&container_path)?;
    container.write_to(&container_path)?;

    // Sample input lives next to the input list, referenced relatively.
    let list_path = root.join(&spec.inputs);
    create_parent(&list_path)?;
    let input_name = format!("{name}.raw");
    let input_path = list_path
        .parent()
        .map_or_else(|| PathBuf::from(&input_name), |p| p.join(&input_name));
    let raw: Vec<u8> = (0..elements)
        .flat_map(|i| ((i % 256) as f32 / 255.0).to_le_bytes())
        .collect();
    std::fs::write(&input_path, raw)
        .map_err(|e| anyhow::anyhow!("cannot write '{}': {e}", input_path.display()))?;
    std::fs::write(&list_path, format!("# sample input for {name}\ninput:={input_name}\n"))
        .map_err(|e| anyhow::anyhow!("cannot write '{}': {e}", list_path.display()))?;

    Ok(true)
}

fn create_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| anyhow::anyhow!("cannot create '{}': {e}", parent.display()))?;
    }
    Ok(())
}

fn write_new(path: &Path, content: &str, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        return Ok(());
    }
    std::fs::write(path, content)
        .map_err(|e| anyhow::anyhow!("cannot write '{}': {e}", path.display()))
}
