// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Latency-aware dynamic placement.
//!
//! For each available runtime in preference order (DSP, GPU, CPU), the
//! queueing delay a new job would see is estimated as
//!
//! ```text
//! estimate_ms = queue_depth × smoothed_latency_ms[model][runtime]
//! ```
//!
//! The first runtime whose estimate fits in the slack budget (the model's
//! own inter-arrival period) wins. If none fits, placement falls back to
//! join-shortest-queue.

use super::jsq::shortest_queue;
use super::{LoadView, RuntimeSelector, SelectionInput};
use inference_backend::RuntimeKind;
use rand::rngs::SmallRng;

#[derive(Debug, Clone, Copy, Default)]
pub struct LatencyAware;

impl LatencyAware {
    /// Predicted queueing delay for `model` on `runtime`, in ms.
    pub fn estimate_ms(load: &dyn LoadView, model: &str, runtime: RuntimeKind) -> f64 {
        load.queue_depth(runtime) as f64 * load.latency_ms(model, runtime)
    }
}

impl RuntimeSelector for LatencyAware {
    fn name(&self) -> &str {
        "DYNAMIC"
    }

    fn select(
        &self,
        input: &SelectionInput<'_>,
        load: &dyn LoadView,
        _rng: &mut SmallRng,
    ) -> Option<RuntimeKind> {
        RuntimeKind::PREFERENCE
            .into_iter()
            .filter(|rt| input.is_available(*rt))
            .find(|rt| Self::estimate_ms(load, input.model, *rt) <= input.slack_ms)
            .or_else(|| shortest_queue(input.available, load))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::testing::StaticLoad;
    use rand::SeedableRng;

    const ALL: [RuntimeKind; 3] = [RuntimeKind::Cpu, RuntimeKind::Gpu, RuntimeKind::Dsp];

    fn pick(available: &[RuntimeKind], load: &StaticLoad, slack_ms: f64) -> Option<RuntimeKind> {
        let input = SelectionInput {
            model: "m",
            available,
            slack_ms,
        };
        LatencyAware.select(&input, load, &mut SmallRng::seed_from_u64(0))
    }

    #[test]
    fn test_prefers_dsp_within_slack() {
        // 3 × 20 ms = 60 ms ≤ 100 ms, even though the GPU queue is empty.
        let load = StaticLoad::depths(&[(RuntimeKind::Dsp, 3), (RuntimeKind::Gpu, 0)])
            .with_latency(RuntimeKind::Dsp, 20.0);
        assert_eq!(pick(&ALL, &load, 100.0), Some(RuntimeKind::Dsp));
    }

    #[test]
    fn test_moves_to_gpu_when_dsp_over_budget() {
        // DSP: 6 × 20 = 120 ms > 100. GPU: 2 × 10 = 20 ms.
        let load = StaticLoad::depths(&[(RuntimeKind::Dsp, 6), (RuntimeKind::Gpu, 2)])
            .with_latency(RuntimeKind::Dsp, 20.0)
            .with_latency(RuntimeKind::Gpu, 10.0);
        assert_eq!(pick(&ALL, &load, 100.0), Some(RuntimeKind::Gpu));
    }

    #[test]
    fn test_falls_back_to_jsq() {
        let load = StaticLoad::depths(&[
            (RuntimeKind::Cpu, 4),
            (RuntimeKind::Gpu, 9),
            (RuntimeKind::Dsp, 7),
        ])
        .with_latency(RuntimeKind::Cpu, 50.0)
        .with_latency(RuntimeKind::Gpu, 50.0)
        .with_latency(RuntimeKind::Dsp, 50.0);
        // Every estimate exceeds 100 ms; JSQ picks CPU (depth 4).
        assert_eq!(pick(&ALL, &load, 100.0), Some(RuntimeKind::Cpu));
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let load = StaticLoad::depths(&[(RuntimeKind::Dsp, 5)]).with_latency(RuntimeKind::Dsp, 20.0);
        assert_eq!(pick(&ALL, &load, 100.0), Some(RuntimeKind::Dsp));
    }

    #[test]
    fn test_skips_unavailable_preferred_runtime() {
        // DSP would fit but is not available for this model.
        let load = StaticLoad::depths(&[(RuntimeKind::Cpu, 1)]);
        assert_eq!(
            pick(&[RuntimeKind::Cpu, RuntimeKind::Gpu], &load, 50.0),
            Some(RuntimeKind::Gpu)
        );
    }
}
