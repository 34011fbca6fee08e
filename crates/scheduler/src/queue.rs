// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-runtime FIFO work queues.
//!
//! Each runtime owns one [`RuntimeQueue`], shared between exactly one
//! producer (the job generator) and one consumer (that runtime's worker).
//! The consumer blocks on a condition variable; it never spins.
//!
//! ```text
//! JobGenerator ──push──► RuntimeQueue ──pop_tracked──► worker
//!                                          │
//!                                          └─► InFlightGuard (in-flight +1 until drop)
//! ```

use crate::metrics::RunStats;
use inference_backend::RuntimeKind;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Instant;
use workload::ModelSpec;

/// One unit of work: run `model` on `runtime` before `deadline`.
#[derive(Debug, Clone)]
pub struct Request {
    pub model: Arc<ModelSpec>,
    pub runtime: RuntimeKind,
    pub deadline: Instant,
    /// Counters of the run that issued this request.
    pub stats: Arc<RunStats>,
}

impl Request {
    pub fn is_expired(&self, now: Instant) -> bool {
        now > self.deadline
    }
}

/// Decrements the shared in-flight counter when dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    counter: Arc<AtomicUsize>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Result of forcibly emptying a queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainCount {
    /// Requests discarded in total.
    pub discarded: usize,
    /// Of those, requests whose deadline had already passed.
    pub expired: usize,
}

/// A thread-safe FIFO with blocking pop and wake-on-stop.
#[derive(Debug)]
pub struct RuntimeQueue {
    runtime: RuntimeKind,
    items: Mutex<VecDeque<Request>>,
    ready: Condvar,
    stop: Arc<AtomicBool>,
}

impl RuntimeQueue {
    /// Creates an empty queue observing the shared `stop` latch.
    pub fn new(runtime: RuntimeKind, stop: Arc<AtomicBool>) -> Self {
        Self {
            runtime,
            items: Mutex::new(VecDeque::new()),
            ready: Condvar::new(),
            stop,
        }
    }

    pub fn runtime(&self) -> RuntimeKind {
        self.runtime
    }

    /// Appends a request and wakes the consumer.
    pub fn push(&self, request: Request) {
        self.lock().push_back(request);
        self.ready.notify_one();
    }

    /// Blocks until a request is available or the stop latch is set.
    ///
    /// Returns `None` only when the queue is empty and stop has been set.
    pub fn pop(&self) -> Option<Request> {
        let mut items = self.wait_ready();
        items.pop_front()
    }

    /// Like [`RuntimeQueue::pop`], but increments `in_flight` while still
    /// holding the queue lock, so an observer never sees the request neither
    /// queued nor in flight.
    pub fn pop_tracked(&self, in_flight: &Arc<AtomicUsize>) -> Option<(Request, InFlightGuard)> {
        let mut items = self.wait_ready();
        let request = items.pop_front()?;
        in_flight.fetch_add(1, Ordering::AcqRel);
        drop(items);
        Some((
            request,
            InFlightGuard {
                counter: Arc::clone(in_flight),
            },
        ))
    }

    /// Current depth. May be stale as soon as it is returned.
    pub fn size(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Discards all pending requests.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Discards all pending requests, counting those past their deadline.
    pub fn drain_expired(&self, now: Instant) -> DrainCount {
        let drained: Vec<Request> = self.lock().drain(..).collect();
        DrainCount {
            discarded: drained.len(),
            expired: drained.iter().filter(|r| r.is_expired(now)).count(),
        }
    }

    /// Wakes a blocked consumer so it can observe the stop latch.
    pub fn wake_all(&self) {
        let _items = self.lock();
        self.ready.notify_all();
    }

    fn wait_ready(&self) -> MutexGuard<'_, VecDeque<Request>> {
        let items = self.lock();
        self.ready
            .wait_while(items, |q| q.is_empty() && !self.stop.load(Ordering::Acquire))
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Request>> {
        self.items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
