// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # sched-rt
//!
//! Command-line interface for the multi-runtime inference scheduler.
//!
//! ## Usage
//! ```bash
//! # Write demo model containers and input lists for the built-in workload
//! sched-rt scaffold --dir ./demo
//!
//! # Compare every policy on every scenario and scale
//! sched-rt sweep --output results.csv --json results.json
//!
//! # Show which runtimes each model can use on this host
//! sched-rt preload --present cpu,dsp
//!
//! # List the configured workload mixes
//! sched-rt scenarios --workload workload.toml
//! ```

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sched-rt",
    about = "Periodic inference scheduler for CPU/GPU/DSP runtimes",
    version,
    author
)]
struct Cli {
    /// Path to a scheduler TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Knobs of the simulated inference engine.
#[derive(clap::Args, Debug, Clone)]
struct EngineArgs {
    /// Runtimes present on the host (comma-separated: cpu,gpu,dsp).
    #[arg(long, default_value = "cpu,gpu,dsp")]
    present: String,

    /// Probability that one execution fails.
    #[arg(long, default_value_t = 0.0)]
    failure_rate: f64,

    /// Relative latency jitter (0.1 = ±10%).
    #[arg(long, default_value_t = 0.0)]
    jitter: f64,

    /// Multiplier applied to every model latency.
    #[arg(long, default_value_t = 1.0)]
    latency_scale: f64,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every (scenario, scale, policy) combination and report miss rates.
    Sweep {
        /// Workload TOML file (defaults to the built-in AR_Assistant mix).
        #[arg(short, long)]
        workload: Option<PathBuf>,

        /// CSV report path (overrides the config's report_path).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the sweep as JSON to this path.
        #[arg(long)]
        json: Option<PathBuf>,

        /// Generation time per run in milliseconds.
        #[arg(long)]
        duration_ms: Option<u64>,

        /// Comma-separated scale factors (e.g., "0.5,1,2").
        #[arg(long)]
        scales: Option<String>,

        /// Comma-separated policies (e.g., "JSQ,DYNAMIC").
        #[arg(long)]
        policies: Option<String>,

        /// Comma-separated runtimes to schedule onto.
        #[arg(long)]
        backends: Option<String>,

        /// RNG seed for reproducible runs.
        #[arg(long)]
        seed: Option<u64>,

        /// Do not pin worker threads to cores.
        #[arg(long)]
        no_pin: bool,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Build every (model, runtime) handle and print the availability table.
    Preload {
        /// Workload TOML file (defaults to the built-in AR_Assistant mix).
        #[arg(short, long)]
        workload: Option<PathBuf>,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// List the configured scenarios and their model streams.
    Scenarios {
        /// Workload TOML file (defaults to the built-in AR_Assistant mix).
        #[arg(short, long)]
        workload: Option<PathBuf>,
    },

    /// Write demo model containers, inputs, and config files.
    Scaffold {
        /// Directory to populate.
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Workload TOML whose models should be scaffolded.
        #[arg(short, long)]
        workload: Option<PathBuf>,

        /// Overwrite existing files.
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging based on verbosity.
    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Sweep {
            workload,
            output,
            json,
            duration_ms,
            scales,
            policies,
            backends,
            seed,
            no_pin,
            engine,
        } => commands::sweep::execute(commands::sweep::SweepArgs {
            config: cli.config,
            workload,
            output,
            json,
            duration_ms,
            scales,
            policies,
            backends,
            seed,
            no_pin,
            engine: engine.into(),
        }),
        Commands::Preload { workload, engine } => {
            commands::preload::execute(cli.config, workload, engine.into())
        }
        Commands::Scenarios { workload } => commands::scenarios::execute(workload),
        Commands::Scaffold {
            dir,
            workload,
            force,
        } => commands::scaffold::execute(dir, workload, force),
    }
}

impl From<EngineArgs> for commands::EngineOptions {
    fn from(args: EngineArgs) -> Self {
        Self {
            present: args.present,
            failure_rate: args.failure_rate,
            jitter: args.jitter,
            latency_scale: args.latency_scale,
        }
    }
}
