// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Shared scheduler state, owned explicitly instead of living in globals.
//!
//! One [`SchedulerContext`] is created per scheduler instance and shared
//! through an `Arc` by the driver thread and every worker thread. Tests
//! can build as many independent instances as they like.

use crate::latency::LatencyTracker;
use crate::policy::LoadView;
use crate::queue::{DrainCount, RuntimeQueue};
use crate::registry::ModelRegistry;
use inference_backend::{InferenceBackend, RuntimeKind};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Queues, registry, latency records and counters for one scheduler.
pub struct SchedulerContext<B: InferenceBackend> {
    backend: Arc<B>,
    registry: ModelRegistry<B>,
    latency: LatencyTracker,
    queues: Vec<RuntimeQueue>,
    in_flight: Arc<AtomicUsize>,
    stop: Arc<AtomicBool>,
}

impl<B: InferenceBackend> SchedulerContext<B> {
    /// Creates one queue per configured backend, in the given order.
    pub fn new(
        backend: Arc<B>,
        registry: ModelRegistry<B>,
        latency: LatencyTracker,
        backends: &[RuntimeKind],
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let queues = backends
            .iter()
            .map(|rt| RuntimeQueue::new(*rt, Arc::clone(&stop)))
            .collect();
        Self {
            backend,
            registry,
            latency,
            queues,
            in_flight: Arc::new(AtomicUsize::new(0)),
            stop,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn registry(&self) -> &ModelRegistry<B> {
        &self.registry
    }

    pub fn latency(&self) -> &LatencyTracker {
        &self.latency
    }

    /// The queue for `runtime`, if it is a configured backend.
    pub fn queue(&self, runtime: RuntimeKind) -> Option<&RuntimeQueue> {
        self.queues.iter().find(|q| q.runtime() == runtime)
    }

    pub fn queues(&self) -> &[RuntimeQueue] {
        &self.queues
    }

    /// Configured backends, in queue order.
    pub fn backends(&self) -> Vec<RuntimeKind> {
        self.queues.iter().map(|q| q.runtime()).collect()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub(crate) fn in_flight_counter(&self) -> &Arc<AtomicUsize> {
        &self.in_flight
    }

    /// Total requests waiting across all queues.
    pub fn queued(&self) -> usize {
        self.queues.iter().map(|q| q.size()).sum()
    }

    /// True when nothing is queued and nothing is executing.
    pub fn is_idle(&self) -> bool {
        self.in_flight() == 0 && self.queues.iter().all(|q| q.is_empty())
    }

    pub fn clear_queues(&self) {
        for q in &self.queues {
            q.clear();
        }
    }

    /// Empties every queue, counting requests already past their deadline.
    pub fn drain_expired(&self, now: Instant) -> DrainCount {
        self.queues.iter().fold(DrainCount::default(), |acc, q| {
            let d = q.drain_expired(now);
            DrainCount {
                discarded: acc.discarded + d.discarded,
                expired: acc.expired + d.expired,
            }
        })
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Sets the one-way stop latch and wakes every blocked worker.
    pub fn shutdown(&self) {
        self.stop.store(true, Ordering::Release);
        for q in &self.queues {
            q.wake_all();
        }
    }
}

impl<B: InferenceBackend> LoadView for SchedulerContext<B> {
    fn queue_depth(&self, runtime: RuntimeKind) -> usize {
        self.queue(runtime).map(|q| q.size()).unwrap_or(0)
    }

    fn latency_ms(&self, model: &str, runtime: RuntimeKind) -> f64 {
        self.latency.average(model, runtime)
    }
}

impl<B: InferenceBackend> std::fmt::Debug for SchedulerContext<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerContext")
            .field("backends", &self.backends())
            .field("queued", &self.queued())
            .field("in_flight", &self.in_flight())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}
