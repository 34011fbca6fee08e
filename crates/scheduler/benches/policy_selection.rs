// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for runtime selection and latency tracking.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use inference_backend::RuntimeKind;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use scheduler::{LatencyTracker, LoadView, Policy, SelectionInput, DEFAULT_SAMPLE_WEIGHT};

struct FixedLoad {
    depths: [usize; 3],
    latency: [f64; 3],
}

impl LoadView for FixedLoad {
    fn queue_depth(&self, runtime: RuntimeKind) -> usize {
        self.depths[runtime.index()]
    }

    fn latency_ms(&self, _model: &str, runtime: RuntimeKind) -> f64 {
        self.latency[runtime.index()]
    }
}

fn bench_policy_select(c: &mut Criterion) {
    let load = FixedLoad {
        depths: [4, 7, 9],
        latency: [18.0, 9.0, 12.0],
    };
    let input = SelectionInput {
        model: "models/DE_midas_v21_small_quant.toml",
        available: &RuntimeKind::ALL,
        slack_ms: 33.3,
    };
    let mut group = c.benchmark_group("policy_select");
    for policy in Policy::ALL {
        let selector = policy.selector();
        let mut rng = SmallRng::seed_from_u64(1);
        group.bench_function(policy.as_str(), |b| {
            b.iter(|| selector.select(black_box(&input), &load, &mut rng))
        });
    }
    group.finish();
}

fn bench_latency_record(c: &mut Criterion) {
    let models: Vec<String> = (0..8).map(|i| format!("models/m{i}.toml")).collect();
    let tracker = LatencyTracker::new(models.iter().cloned(), DEFAULT_SAMPLE_WEIGHT);
    c.bench_function("latency_record", |b| {
        b.iter(|| tracker.record(black_box("models/m5.toml"), RuntimeKind::Gpu, black_box(12.5)))
    });
}

criterion_group!(benches, bench_policy_select, bench_latency_record);
criterion_main!(benches);
