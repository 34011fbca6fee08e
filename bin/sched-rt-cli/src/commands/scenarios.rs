// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `sched-rt scenarios` command: list workload mixes.

use super::{load_workload, truncate};
use std::path::PathBuf;

pub fn execute(workload: Option<PathBuf>) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║              sched-rt · Workload Mixes              ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let table = load_workload(workload.as_deref())?;

    for scenario in table.iter() {
        println!(
            "  {}  ({} streams, {:.1} jobs/s nominal, {:.1} jobs/s expected)",
            scenario.name,
            scenario.models.len(),
            scenario.total_rate(),
            scenario.expected_rate(),
        );
        println!(
            "   {:<30} {:>8} {:>8} {:>10}  {}",
            "Model", "Rate Hz", "P(fire)", "Period ms", "Inputs",
        );
        println!("   {}", "-".repeat(80));
        for m in &scenario.models {
            println!(
                "   {:<30} {:>8.1} {:>8.2} {:>10.1}  {}",
                truncate(&m.short_name(), 30),
                m.rate,
                m.probability,
                1000.0 / m.rate,
                m.inputs.display(),
            );
        }
        println!();
    }

    Ok(())
}
