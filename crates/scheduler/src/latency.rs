// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Exponentially smoothed execution latency per (model, runtime).
//!
//! Each record is a single `f64` stored as bits in an `AtomicU64`. Only the
//! worker for a runtime writes that runtime's records; the generator reads
//! them from another thread and tolerates staleness, so relaxed ordering is
//! enough.

use inference_backend::RuntimeKind;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Starting value of every record, in milliseconds.
pub const INITIAL_LATENCY_MS: f64 = 1.0;

/// Weight given to each new sample.
pub const DEFAULT_SAMPLE_WEIGHT: f64 = 0.1;

/// One smoothed latency value.
#[derive(Debug)]
pub struct LatencyRecord {
    bits: AtomicU64,
}

impl LatencyRecord {
    pub fn new(initial: f64) -> Self {
        Self {
            bits: AtomicU64::new(initial.to_bits()),
        }
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }

    /// `avg ← (1 − w)·avg + w·sample`. Single writer only.
    pub fn update(&self, sample: f64, sample_weight: f64) -> f64 {
        let next = (1.0 - sample_weight) * self.get() + sample_weight * sample;
        self.bits.store(next.to_bits(), Ordering::Relaxed);
        next
    }
}

impl Default for LatencyRecord {
    fn default() -> Self {
        Self::new(INITIAL_LATENCY_MS)
    }
}

/// Latency records for every known model on every runtime.
///
/// The model set is fixed at construction; only the values change.
#[derive(Debug)]
pub struct LatencyTracker {
    sample_weight: f64,
    records: HashMap<String, [LatencyRecord; 3]>,
}

impl LatencyTracker {
    /// Creates records seeded at [`INITIAL_LATENCY_MS`] for each model.
    pub fn new<I, S>(models: I, sample_weight: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let records = models
            .into_iter()
            .map(|m| (m.into(), Default::default()))
            .collect();
        Self {
            sample_weight,
            records,
        }
    }

    pub fn sample_weight(&self) -> f64 {
        self.sample_weight
    }

    /// Smoothed latency in ms; unknown models read as [`INITIAL_LATENCY_MS`].
    pub fn average(&self, model: &str, runtime: RuntimeKind) -> f64 {
        self.records
            .get(model)
            .map(|r| r[runtime.index()].get())
            .unwrap_or(INITIAL_LATENCY_MS)
    }

    /// Folds a new sample into the record. Returns the new average, or
    /// `None` for a model the tracker was not built with.
    pub fn record(&self, model: &str, runtime: RuntimeKind, sample_ms: f64) -> Option<f64> {
        let rec = self.records.get(model)?;
        Some(rec[runtime.index()].update(sample_ms, self.sample_weight))
    }

    /// Snapshot of every record, for reporting.
    pub fn snapshot(&self) -> Vec<(String, RuntimeKind, f64)> {
        let mut out: Vec<_> = self
            .records
            .iter()
            .flat_map(|(m, recs)| {
                RuntimeKind::ALL
                    .iter()
                    .map(move |rt| (m.clone(), *rt, recs[rt.index()].get()))
            })
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
        out
    }
}
